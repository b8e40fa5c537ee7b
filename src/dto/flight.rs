use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_minutes_seconds,
    state::{
        flight::{FlightSession, FlightTracker, HoleTimingRecord, PlayerRef},
        round::RoundPhase,
    },
};

/// Payload confirming a flight setup and starting its round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartFlightRequest {
    /// Display number of the flight.
    pub flight_number: u32,
    /// Club the flight belongs to.
    #[validate(length(min = 1, message = "club id must not be empty"))]
    pub club_id: String,
    /// Course the flight plays on.
    #[validate(length(min = 1, message = "course id must not be empty"))]
    pub course_id: String,
    /// Join code shared between the flight's players.
    #[validate(length(min = 1, message = "session code must not be empty"))]
    pub session_code: String,
    /// Scheduled tee time, kept verbatim.
    pub tee_time: String,
    /// Players taking part in the round.
    #[validate(nested)]
    pub players: Vec<PlayerInput>,
}

/// Incoming player reference for flight registration.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlayerInput {
    /// Player identifier, when authenticated.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[validate(length(min = 1, message = "player name must not be empty"))]
    pub name: String,
}

impl From<PlayerInput> for PlayerRef {
    fn from(value: PlayerInput) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

/// Wire representation of the round lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhaseDto {
    /// Registered, tracking not yet begun.
    NotStarted,
    /// Round active, telemetry collected.
    Started,
    /// Stop requested, awaiting confirmation.
    Closing,
    /// Round finalized. Terminal.
    Completed,
}

impl From<RoundPhase> for RoundPhaseDto {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::NotStarted => RoundPhaseDto::NotStarted,
            RoundPhase::Started => RoundPhaseDto::Started,
            RoundPhase::Closing => RoundPhaseDto::Closing,
            RoundPhase::Completed => RoundPhaseDto::Completed,
        }
    }
}

/// One recorded hole traversal.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HoleRecordDto {
    /// Hole number.
    pub hole_number: u8,
    /// Par, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub par: Option<u8>,
    /// Stroke index, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_index: Option<u8>,
    /// Configured target duration in seconds.
    pub target_seconds: i64,
    /// Measured duration in whole seconds.
    pub total_time_seconds: i64,
    /// Measured duration rendered `m:ss`.
    pub total_time_display: String,
    /// Measured minus target, seconds. Positive means late.
    pub delta_seconds: i64,
    /// Binary late flag; consuming UIs apply their own banding on the delta.
    pub late: bool,
}

impl From<&HoleTimingRecord> for HoleRecordDto {
    fn from(value: &HoleTimingRecord) -> Self {
        Self {
            hole_number: value.hole_number,
            par: value.par,
            stroke_index: value.stroke_index,
            target_seconds: value.target_seconds,
            total_time_seconds: value.total_time_seconds,
            total_time_display: format_minutes_seconds(value.total_time_seconds),
            delta_seconds: value.delta_seconds,
            late: value.late(),
        }
    }
}

/// Snapshot of a tracked flight.
#[derive(Debug, Serialize, ToSchema)]
pub struct FlightSummary {
    /// Flight identifier.
    pub id: Uuid,
    /// Display number.
    pub flight_number: u32,
    /// Club identifier.
    pub club_id: String,
    /// Course identifier.
    pub course_id: String,
    /// Join code.
    pub session_code: String,
    /// Scheduled tee time, verbatim.
    pub tee_time: String,
    /// Current lifecycle phase.
    pub phase: RoundPhaseDto,
    /// Whether the physical capture service is running.
    pub capture_running: bool,
    /// Sum of deltas over recorded holes, seconds.
    pub cumulative_delay_seconds: i64,
    /// Open entries discarded by last-enter-wins, for data-quality checks.
    pub dropped_opens: u64,
    /// Recorded holes so far, in traversal order.
    pub timeline: Vec<HoleRecordDto>,
}

impl FlightSummary {
    /// Assemble a summary from the tracker's session and runtime state.
    pub async fn from_tracker(tracker: &FlightTracker) -> Self {
        let FlightSession {
            id,
            flight_number,
            club_id,
            course_id,
            session_code,
            tee_time,
            ..
        } = tracker.session().clone();

        let phase = tracker.phase().await.into();
        let capture_running = tracker.capture_running().await;
        let timing = tracker.timing().lock().await;

        Self {
            id,
            flight_number,
            club_id,
            course_id,
            session_code,
            tee_time,
            phase,
            capture_running,
            cumulative_delay_seconds: timing.cumulative_delay_seconds,
            dropped_opens: timing.dropped_opens,
            timeline: timing.timeline.iter().map(HoleRecordDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_session_code_is_rejected() {
        let request = StartFlightRequest {
            flight_number: 1,
            club_id: "club_pinetina".into(),
            course_id: "default".into(),
            session_code: "".into(),
            tee_time: "2026-08-23T08:30:00Z".into(),
            players: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn late_flag_follows_delta_sign() {
        let record = HoleTimingRecord {
            hole_number: 4,
            par: Some(4),
            stroke_index: None,
            target_seconds: 840,
            total_time_seconds: 600,
            delta_seconds: -240,
        };
        let dto = HoleRecordDto::from(&record);
        assert!(!dto.late);
        assert_eq!(dto.total_time_display, "10:00");
    }
}
