use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::PaceSettingsEntity,
    dto::{
        flight::HoleRecordDto,
        sse::{
            AlertKind, HoleRecordEvent, PaceAlertEvent, PhaseChangedEvent, ServerEvent,
            SystemStatus, TrackingStatusEvent,
        },
    },
    state::{SharedState, flight::FlightTracker, round::RoundPhase},
};

const EVENT_SYSTEM_STATUS: &str = "system.status";
const EVENT_TRACKING_STATUS: &str = "tracking.status";
const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_HOLE_RECORD: &str = "hole.record";
const EVENT_PACE_ALERT: &str = "pace.alert";

/// Broadcast the degraded flag to both streams.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_player_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_monitor_event(state, EVENT_SYSTEM_STATUS, &payload);
}

/// Echo the current round phase to player devices. Sent on every accepted
/// position report so devices never act on a cached phase.
pub fn broadcast_tracking_status(state: &SharedState, tracker: &FlightTracker, phase: RoundPhase) {
    let session = tracker.session();
    let payload = TrackingStatusEvent {
        flight_id: session.id,
        session_code: session.session_code.clone(),
        phase: phase.into(),
    };
    send_player_event(state, EVENT_TRACKING_STATUS, &payload);
}

/// Broadcast a round phase change to both streams.
pub fn broadcast_phase_changed(state: &SharedState, tracker: &FlightTracker, phase: RoundPhase) {
    let session = tracker.session();
    let payload = PhaseChangedEvent {
        flight_id: session.id,
        flight_number: session.flight_number,
        phase: phase.into(),
    };
    send_player_event(state, EVENT_PHASE_CHANGED, &payload);
    send_monitor_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast a freshly recorded hole timing to the monitoring stream.
pub fn broadcast_hole_record(
    state: &SharedState,
    tracker: &FlightTracker,
    record: HoleRecordDto,
    cumulative_delay_seconds: i64,
) {
    let session = tracker.session();
    let payload = HoleRecordEvent {
        flight_id: session.id,
        flight_number: session.flight_number,
        record,
        cumulative_delay_seconds,
    };
    send_monitor_event(state, EVENT_HOLE_RECORD, &payload);
}

/// Fan a pace alert out to the channels the club settings enable.
pub fn broadcast_pace_alert(
    state: &SharedState,
    tracker: &FlightTracker,
    settings: &PaceSettingsEntity,
    cumulative_delay_minutes: i64,
) {
    let session = tracker.session();
    let alert = |kind: AlertKind| PaceAlertEvent {
        flight_id: session.id,
        flight_number: session.flight_number,
        kind,
        cumulative_delay_minutes,
        threshold_minutes: settings.alert_threshold_minutes,
    };

    if settings.auto_notify_player {
        send_player_event(state, EVENT_PACE_ALERT, &alert(AlertKind::NotifyPlayer));
    }
    if settings.auto_notify_marshall {
        send_monitor_event(state, EVENT_PACE_ALERT, &alert(AlertKind::NotifyMarshall));
    }
    if settings.enable_audio_alerts {
        send_monitor_event(state, EVENT_PACE_ALERT, &alert(AlertKind::AudioAlert));
    }
}

fn send_player_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.player_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize player SSE payload"),
    }
}

fn send_monitor_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.monitor_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize monitor SSE payload"),
    }
}
