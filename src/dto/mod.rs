/// Club analytics payloads.
pub mod analytics;
/// Flight lifecycle payloads.
pub mod flight;
/// Health check payload.
pub mod health;
/// Pace configuration payloads.
pub mod pace;
/// Server-sent event payloads.
pub mod sse;
/// Position and boundary ingestion payloads.
pub mod telemetry;
/// Field-level validation helpers.
pub mod validation;

/// Render whole seconds as `m:ss`, flooring the minute component.
pub fn format_minutes_seconds(total_seconds: i64) -> String {
    let seconds = total_seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_rendering_floors_minutes() {
        assert_eq!(format_minutes_seconds(600), "10:00");
        assert_eq!(format_minutes_seconds(754), "12:34");
        assert_eq!(format_minutes_seconds(59), "0:59");
        assert_eq!(format_minutes_seconds(-5), "0:00");
    }
}
