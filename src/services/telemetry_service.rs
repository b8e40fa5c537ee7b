use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::models::LivePositionEntity,
    dto::telemetry::{IngestAck, IngestOutcome, PositionReport},
    error::ServiceError,
    services::notifications,
    state::{SharedState, flight::FlightTracker, round::RoundPhase},
};

/// Ingest one GPS sample from a player device.
///
/// The lifecycle phase is re-read on every report and echoed back, so devices
/// whose round was stopped elsewhere learn about it on their next sample.
/// Samples inside the throttle window are dropped, never queued; forwarding
/// to storage is fire-and-forget so a slow backend cannot stall ingestion.
pub async fn ingest_position(
    state: &SharedState,
    flight_id: Uuid,
    report: PositionReport,
) -> Result<IngestAck, ServiceError> {
    let tracker = state.require_flight(flight_id)?;

    let phase = tracker.phase().await;
    notifications::broadcast_tracking_status(state, &tracker, phase);

    if phase != RoundPhase::Started {
        debug!(%flight_id, ?phase, "dropping position report outside an active round");
        return Ok(ack(IngestOutcome::DroppedInactive, phase));
    }

    let window_ms = state.config().throttle_window_ms();
    if !tracker
        .try_claim_forward_slot(report.captured_at_ms, window_ms)
        .await
    {
        return Ok(ack(IngestOutcome::DroppedThrottled, phase));
    }

    forward_position(state, &tracker, report);
    Ok(ack(IngestOutcome::Forwarded, phase))
}

fn ack(outcome: IngestOutcome, phase: RoundPhase) -> IngestAck {
    IngestAck {
        outcome,
        phase: phase.into(),
    }
}

/// Push the sample to the live flight document without blocking the caller.
/// Storage failures are logged and the sample is lost; the next slot claim
/// retries with fresher data anyway.
fn forward_position(state: &SharedState, tracker: &FlightTracker, report: PositionReport) {
    let session = tracker.session();
    let flight_id = session.id;
    let position = LivePositionEntity {
        lat: report.lat,
        lng: report.lng,
        player_id: report.player_id,
        player_name: report.player_name,
        session_code: session.session_code.clone(),
        club_id: session.club_id.clone(),
        course_id: session.course_id.clone(),
        captured_at_ms: report.captured_at_ms,
    };

    let state = state.clone();
    tokio::spawn(async move {
        match state.pace_store().await {
            Some(store) => {
                if let Err(err) = store.update_live_position(flight_id, position).await {
                    warn!(%flight_id, error = %err, "failed to sync live position");
                }
            }
            None => warn!(%flight_id, "live position dropped (degraded mode)"),
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::pace_store::memory::MemoryPaceStore,
        dto::flight::{PlayerInput, StartFlightRequest},
        services::{capture::testing::CountingCapture, round_service},
        state::AppState,
    };

    fn report(captured_at_ms: i64) -> PositionReport {
        PositionReport {
            lat: 45.806,
            lng: 9.087,
            player_id: None,
            player_name: Some("Guest Player".into()),
            captured_at_ms,
        }
    }

    async fn started_flight(state: &SharedState) -> Uuid {
        let request = StartFlightRequest {
            flight_number: 3,
            club_id: "club_pinetina".into(),
            course_id: "default".into(),
            session_code: "C4D5".into(),
            tee_time: "2026-08-23T10:00:00Z".into(),
            players: vec![PlayerInput {
                id: None,
                name: "Guest Player".into(),
            }],
        };
        round_service::start_flight(state, request).await.unwrap().id
    }

    async fn test_state() -> SharedState {
        let state = AppState::with_capture(
            AppConfig::default(),
            Arc::new(CountingCapture::default()),
        );
        state
            .install_pace_store(Arc::new(MemoryPaceStore::default()))
            .await;
        state
    }

    #[tokio::test]
    async fn throttle_forwards_exactly_the_out_of_window_samples() {
        let state = test_state().await;
        let flight_id = started_flight(&state).await;

        let mut outcomes = Vec::new();
        for at_ms in [0, 3_000, 7_000, 11_000] {
            let ack = ingest_position(&state, flight_id, report(at_ms)).await.unwrap();
            outcomes.push(ack.outcome);
        }

        assert_eq!(
            outcomes,
            vec![
                IngestOutcome::Forwarded,
                IngestOutcome::DroppedThrottled,
                IngestOutcome::DroppedThrottled,
                IngestOutcome::Forwarded,
            ]
        );
    }

    #[tokio::test]
    async fn reports_outside_an_active_round_are_dropped() {
        let state = test_state().await;
        let flight_id = started_flight(&state).await;

        round_service::request_stop(&state, flight_id).await.unwrap();

        let ack = ingest_position(&state, flight_id, report(0)).await.unwrap();
        assert_eq!(ack.outcome, IngestOutcome::DroppedInactive);
    }

    #[tokio::test]
    async fn unknown_flight_is_a_not_found_error() {
        let state = test_state().await;
        let err = ingest_position(&state, Uuid::new_v4(), report(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
