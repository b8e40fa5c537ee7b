use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::{
    flight::RoundPhaseDto,
    validation::{validate_hole_number, validate_latitude, validate_longitude},
};

/// One GPS sample reported by a player device.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PositionReport {
    /// Latitude in decimal degrees.
    #[validate(custom(function = validate_latitude))]
    pub lat: f64,
    /// Longitude in decimal degrees.
    #[validate(custom(function = validate_longitude))]
    pub lng: f64,
    /// Identifier of the reporting player, when authenticated.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Display name of the reporting player.
    #[serde(default)]
    pub player_name: Option<String>,
    /// Device capture timestamp, epoch milliseconds. Throttling compares
    /// these rather than server arrival times.
    pub captured_at_ms: i64,
}

/// What happened to a reported position sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Sample claimed the throttle slot and was forwarded to storage.
    Forwarded,
    /// Round is not in the `started` phase; sample discarded.
    DroppedInactive,
    /// Sample arrived inside the throttle window; discarded, never queued.
    DroppedThrottled,
}

/// Acknowledgement returned for every accepted position report.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestAck {
    /// Disposition of the sample.
    pub outcome: IngestOutcome,
    /// Lifecycle phase echoed so devices can stop reporting after close.
    pub phase: RoundPhaseDto,
}

/// A hole boundary crossing detected on the device.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, Validate)]
pub struct HoleEventRequest {
    /// Hole whose boundary was crossed.
    #[validate(custom(function = validate_hole_number))]
    pub hole_number: u8,
    /// Device timestamp of the crossing, epoch milliseconds.
    pub timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let report = PositionReport {
            lat: 95.0,
            lng: 9.1,
            player_id: None,
            player_name: None,
            captured_at_ms: 0,
        };
        assert!(report.validate().is_err());
    }

    #[test]
    fn hole_zero_is_rejected() {
        let event = HoleEventRequest {
            hole_number: 0,
            timestamp_ms: 0,
        };
        assert!(event.validate().is_err());
    }
}
