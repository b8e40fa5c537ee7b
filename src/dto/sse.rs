use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::flight::{HoleRecordDto, RoundPhaseDto};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`player` or `monitor`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Echoed to player devices on every position report so long-lived clients
/// never act on a cached lifecycle phase.
pub struct TrackingStatusEvent {
    pub flight_id: Uuid,
    pub session_code: String,
    pub phase: RoundPhaseDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a flight's round phase changes.
pub struct PhaseChangedEvent {
    pub flight_id: Uuid,
    pub flight_number: u32,
    pub phase: RoundPhaseDto,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast to the monitoring stream when a hole timing is recorded.
pub struct HoleRecordEvent {
    pub flight_id: Uuid,
    pub flight_number: u32,
    pub record: HoleRecordDto,
    /// Sum of deltas over the flight's recorded holes, seconds.
    pub cumulative_delay_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Which notification channel a pace alert targets.
pub enum AlertKind {
    /// Sent to the flight's own devices over the player stream.
    NotifyPlayer,
    /// Sent to the marshall's monitoring stream.
    NotifyMarshall,
    /// Asks the monitoring UI to play an alert tone.
    AudioAlert,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per threshold crossing when a flight's cumulative delay
/// exceeds the configured alert threshold.
pub struct PaceAlertEvent {
    pub flight_id: Uuid,
    pub flight_number: u32,
    pub kind: AlertKind,
    /// Cumulative delay at the moment of the crossing, whole minutes.
    pub cumulative_delay_minutes: i64,
    /// Threshold that was crossed, minutes.
    pub threshold_minutes: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Start/stop signal for the background location capture on player devices.
pub struct CaptureSignal {
    pub flight_id: Uuid,
}
