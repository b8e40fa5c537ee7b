use std::{collections::HashMap, sync::Arc};

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{FlightRecordEntity, HoleTimingEntity},
    dto::flight::{FlightSummary, StartFlightRequest},
    error::ServiceError,
    services::notifications,
    state::{
        SharedState,
        flight::{FlightSession, FlightTracker},
        round::RoundEvent,
    },
};

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Confirm a flight setup: register the flight and start its round.
///
/// Reuses an existing non-completed flight with the same session code, so a
/// duplicated confirmation surfaces as an invalid `start` transition instead
/// of silently spawning a second tracker for the same group.
pub async fn start_flight(
    state: &SharedState,
    request: StartFlightRequest,
) -> Result<FlightSummary, ServiceError> {
    let tracker = match state.flight_by_session_code(&request.session_code).await {
        Some(existing) => existing,
        None => {
            let session = FlightSession {
                id: Uuid::new_v4(),
                flight_number: request.flight_number,
                club_id: request.club_id,
                course_id: request.course_id,
                session_code: request.session_code,
                tee_time: request.tee_time,
                players: request.players.into_iter().map(Into::into).collect(),
            };
            state.register_flight(FlightTracker::new(session))
        }
    };

    let (_, phase) = state
        .run_transition(&tracker, RoundEvent::Start, || async {
            tracker.ensure_capture_started(state.capture()).await;
            Ok(())
        })
        .await?;

    info!(
        flight_id = %tracker.session().id,
        flight_number = tracker.session().flight_number,
        "round started"
    );
    notifications::broadcast_phase_changed(state, &tracker, phase);

    Ok(FlightSummary::from_tracker(&tracker).await)
}

/// Player-initiated stop request; the round moves to `closing` and waits for
/// confirmation. Telemetry collection stops immediately.
pub async fn request_stop(
    state: &SharedState,
    flight_id: Uuid,
) -> Result<FlightSummary, ServiceError> {
    let tracker = state.require_flight(flight_id)?;

    let (_, phase) = state
        .run_transition(&tracker, RoundEvent::RequestStop, || async { Ok(()) })
        .await?;

    info!(%flight_id, "round stop requested");
    notifications::broadcast_phase_changed(state, &tracker, phase);

    Ok(FlightSummary::from_tracker(&tracker).await)
}

/// Finalize the round: persist the historical record, then complete.
///
/// Persistence runs between plan and apply, so a failed write leaves the
/// round in `closing` and the confirmation can be retried.
pub async fn confirm_stop(
    state: &SharedState,
    flight_id: Uuid,
) -> Result<FlightSummary, ServiceError> {
    let tracker = state.require_flight(flight_id)?;
    let record = build_flight_record(&tracker).await;

    let (_, phase) = state
        .run_transition(&tracker, RoundEvent::ConfirmStop, || {
            let record = record.clone();
            let state = state.clone();
            async move {
                let store = state.require_pace_store().await?;
                store.save_flight_record(record).await?;
                Ok::<_, ServiceError>(())
            }
        })
        .await?;

    tracker.ensure_capture_stopped(state.capture()).await;
    info!(
        %flight_id,
        total_time_minutes = record.total_time_minutes,
        delay_minutes = record.delay_minutes,
        "round completed and persisted"
    );
    notifications::broadcast_phase_changed(state, &tracker, phase);

    Ok(FlightSummary::from_tracker(&tracker).await)
}

/// Snapshot a registered flight.
pub async fn flight_snapshot(
    state: &SharedState,
    flight_id: Uuid,
) -> Result<FlightSummary, ServiceError> {
    let tracker = state.require_flight(flight_id)?;
    Ok(FlightSummary::from_tracker(&tracker).await)
}

/// Reduce the flight's timeline into the historical close record.
async fn build_flight_record(tracker: &Arc<FlightTracker>) -> FlightRecordEntity {
    let session = tracker.session();
    let timing = tracker.timing().lock().await;

    let total_seconds: i64 = timing
        .timeline
        .iter()
        .map(|record| record.total_time_seconds)
        .sum();
    let hole_stats: HashMap<u8, HoleTimingEntity> = timing
        .timeline
        .iter()
        .cloned()
        .map(|record| (record.hole_number, record.into()))
        .collect();

    FlightRecordEntity {
        flight_id: session.id,
        flight_number: session.flight_number,
        club_id: session.club_id.clone(),
        course_id: session.course_id.clone(),
        total_time_minutes: total_seconds / 60,
        delay_minutes: timing.cumulative_delay_seconds.max(0) / 60,
        timestamp_ms: now_ms(),
        hole_stats,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::pace_store::memory::MemoryPaceStore,
        dto::flight::{PlayerInput, RoundPhaseDto},
        services::capture::testing::CountingCapture,
        state::AppState,
        state::round::RoundPhase,
    };

    fn request(session_code: &str) -> StartFlightRequest {
        StartFlightRequest {
            flight_number: 12,
            club_id: "club_pinetina".into(),
            course_id: "default".into(),
            session_code: session_code.into(),
            tee_time: "2026-08-23T09:10:00Z".into(),
            players: vec![PlayerInput {
                id: None,
                name: "Guest Player".into(),
            }],
        }
    }

    async fn state_with_store(capture: Arc<CountingCapture>) -> (SharedState, MemoryPaceStore) {
        let state = AppState::with_capture(AppConfig::default(), capture);
        let store = MemoryPaceStore::default();
        state.install_pace_store(Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn full_lifecycle_completes_and_persists_one_record() {
        let capture = Arc::new(CountingCapture::default());
        let (state, store) = state_with_store(capture.clone()).await;

        let summary = start_flight(&state, request("A1B2")).await.unwrap();
        assert_eq!(summary.phase, RoundPhaseDto::Started);
        assert!(summary.capture_running);

        let summary = request_stop(&state, summary.id).await.unwrap();
        assert_eq!(summary.phase, RoundPhaseDto::Closing);

        let summary = confirm_stop(&state, summary.id).await.unwrap();
        assert_eq!(summary.phase, RoundPhaseDto::Completed);
        assert!(!summary.capture_running);

        assert_eq!(capture.starts(), 1);
        assert_eq!(capture.stops(), 1);
        assert_eq!(store.flight_records().len(), 1);
    }

    #[tokio::test]
    async fn double_start_is_rejected_without_a_second_native_start() {
        let capture = Arc::new(CountingCapture::default());
        let (state, _store) = state_with_store(capture.clone()).await;

        start_flight(&state, request("A1B2")).await.unwrap();
        let err = start_flight(&state, request("A1B2")).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(capture.starts(), 1);
    }

    #[tokio::test]
    async fn failed_close_persist_keeps_the_round_in_closing() {
        let capture = Arc::new(CountingCapture::default());
        let (state, store) = state_with_store(capture.clone()).await;

        let summary = start_flight(&state, request("A1B2")).await.unwrap();
        request_stop(&state, summary.id).await.unwrap();

        store.set_fail_writes(true);
        let err = confirm_stop(&state, summary.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        let tracker = state.require_flight(summary.id).unwrap();
        assert_eq!(tracker.phase().await, RoundPhase::Closing);
        assert!(tracker.capture_running().await);
        assert!(store.flight_records().is_empty());

        // The retry goes through once the backend recovers.
        store.set_fail_writes(false);
        let summary = confirm_stop(&state, summary.id).await.unwrap();
        assert_eq!(summary.phase, RoundPhaseDto::Completed);
        assert_eq!(store.flight_records().len(), 1);
    }

    #[tokio::test]
    async fn session_code_is_reusable_after_completion() {
        let capture = Arc::new(CountingCapture::default());
        let (state, _store) = state_with_store(capture.clone()).await;

        let summary = start_flight(&state, request("A1B2")).await.unwrap();
        request_stop(&state, summary.id).await.unwrap();
        confirm_stop(&state, summary.id).await.unwrap();

        let next = start_flight(&state, request("A1B2")).await.unwrap();
        assert_ne!(next.id, summary.id);
        assert_eq!(next.phase, RoundPhaseDto::Started);
    }
}
