use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::{
        flight::HoleRecordDto,
        telemetry::HoleEventRequest,
    },
    error::ServiceError,
    services::{notifications, pace_config_service},
    state::{
        SharedState,
        flight::{HoleTimingRecord, OpenHoleEntry},
        round::RoundPhase,
    },
};

/// Record an "enter hole" boundary crossing.
///
/// At most one entry is open per flight. A repeated entry for the same hole
/// keeps the earliest timestamp (the device re-detected the same boundary);
/// an entry for a different hole replaces the open one, since the flight
/// evidently moved on without a detected exit.
pub async fn hole_entered(
    state: &SharedState,
    flight_id: Uuid,
    event: HoleEventRequest,
) -> Result<(), ServiceError> {
    let tracker = state.require_flight(flight_id)?;
    require_active(&tracker).await?;

    let mut timing = tracker.timing().lock().await;
    match timing.open_entry {
        Some(open) if open.hole_number == event.hole_number => {
            debug!(%flight_id, hole = event.hole_number, "duplicate hole entry ignored");
        }
        Some(open) => {
            timing.dropped_opens += 1;
            warn!(
                %flight_id,
                dropped_hole = open.hole_number,
                hole = event.hole_number,
                "unclosed hole entry replaced by a newer one"
            );
            timing.open_entry = Some(OpenHoleEntry {
                hole_number: event.hole_number,
                entered_at_ms: event.timestamp_ms,
            });
        }
        None => {
            timing.open_entry = Some(OpenHoleEntry {
                hole_number: event.hole_number,
                entered_at_ms: event.timestamp_ms,
            });
        }
    }

    Ok(())
}

/// Record an "exit hole" boundary crossing and close the timing for the hole.
///
/// Returns the recorded timing, or `None` when the exit does not match the
/// open entry (boundary noise; nothing is recorded).
pub async fn hole_exited(
    state: &SharedState,
    flight_id: Uuid,
    event: HoleEventRequest,
) -> Result<Option<HoleRecordDto>, ServiceError> {
    let tracker = state.require_flight(flight_id)?;
    require_active(&tracker).await?;

    let session = tracker.session();
    let config =
        pace_config_service::load_config_or_default(state, &session.club_id, &session.course_id)
            .await;

    let (record, cumulative_delay_seconds, crossing) = {
        let mut timing = tracker.timing().lock().await;

        let entered_at_ms = match timing.open_entry {
            Some(open) if open.hole_number == event.hole_number => {
                timing.open_entry = None;
                open.entered_at_ms
            }
            Some(open) => {
                warn!(
                    %flight_id,
                    open_hole = open.hole_number,
                    hole = event.hole_number,
                    "hole exit does not match the open entry; ignoring"
                );
                return Ok(None);
            }
            None => {
                warn!(%flight_id, hole = event.hole_number, "hole exit without an open entry; ignoring");
                return Ok(None);
            }
        };

        let mut total_time_seconds = (event.timestamp_ms - entered_at_ms) / 1_000;
        if total_time_seconds < 0 {
            warn!(
                %flight_id,
                hole = event.hole_number,
                "hole exit precedes its entry; clamping duration to zero"
            );
            total_time_seconds = 0;
        }

        let (target_seconds, metadata) = pace_config_service::hole_target(
            &config,
            event.hole_number,
            state.config().default_target_minutes(),
        );

        let record = HoleTimingRecord {
            hole_number: event.hole_number,
            par: metadata.and_then(|target| target.par),
            stroke_index: metadata.and_then(|target| target.stroke_index),
            target_seconds,
            total_time_seconds,
            delta_seconds: total_time_seconds - target_seconds,
        };

        timing.cumulative_delay_seconds += record.delta_seconds;
        let cumulative = timing.cumulative_delay_seconds;

        // Alert latch: fire once per crossing and re-arm once the flight
        // recovers below the threshold.
        let threshold_seconds = i64::from(config.settings.alert_threshold_minutes) * 60;
        let crossing = if cumulative > threshold_seconds {
            if timing.alert_latched {
                false
            } else {
                timing.alert_latched = true;
                true
            }
        } else {
            timing.alert_latched = false;
            false
        };

        timing.timeline.push(record.clone());
        (record, cumulative, crossing)
    };

    let dto = HoleRecordDto::from(&record);
    notifications::broadcast_hole_record(state, &tracker, dto.clone(), cumulative_delay_seconds);
    if crossing {
        notifications::broadcast_pace_alert(
            state,
            &tracker,
            &config.settings,
            cumulative_delay_seconds / 60,
        );
    }

    persist_timing(state, flight_id, &record).await;
    Ok(Some(dto))
}

async fn require_active(tracker: &crate::state::flight::FlightTracker) -> Result<(), ServiceError> {
    let phase = tracker.phase().await;
    if phase != RoundPhase::Started {
        return Err(ServiceError::InvalidState(format!(
            "boundary events are only accepted while the round is started (phase {phase:?})"
        )));
    }
    Ok(())
}

/// Best-effort write of the per-hole timing; the in-memory timeline remains
/// the source of truth for the close record.
async fn persist_timing(state: &SharedState, flight_id: Uuid, record: &HoleTimingRecord) {
    if let Some(store) = state.pace_store().await {
        if let Err(err) = store
            .append_hole_timing(flight_id, record.clone().into())
            .await
        {
            warn!(%flight_id, hole = record.hole_number, error = %err, "failed to persist hole timing");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast::{self, error::TryRecvError};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{HoleTargetEntity, PaceConfigEntity},
            pace_store::memory::MemoryPaceStore,
        },
        dto::{
            flight::{PlayerInput, StartFlightRequest},
            sse::ServerEvent,
        },
        services::{capture::testing::CountingCapture, round_service},
        state::AppState,
    };

    fn boundary(hole_number: u8, timestamp_ms: i64) -> HoleEventRequest {
        HoleEventRequest {
            hole_number,
            timestamp_ms,
        }
    }

    async fn test_state() -> (SharedState, MemoryPaceStore) {
        let state = AppState::with_capture(
            AppConfig::default(),
            Arc::new(CountingCapture::default()),
        );
        let store = MemoryPaceStore::default();
        state.install_pace_store(Arc::new(store.clone())).await;
        (state, store)
    }

    async fn started_flight(state: &SharedState) -> Uuid {
        let request = StartFlightRequest {
            flight_number: 5,
            club_id: "club_pinetina".into(),
            course_id: "default".into(),
            session_code: "E6F7".into(),
            tee_time: "2026-08-23T08:00:00Z".into(),
            players: vec![PlayerInput {
                id: None,
                name: "Guest Player".into(),
            }],
        };
        round_service::start_flight(state, request).await.unwrap().id
    }

    fn count_alerts(receiver: &mut broadcast::Receiver<ServerEvent>) -> usize {
        let mut alerts = 0;
        loop {
            match receiver.try_recv() {
                Ok(event) if event.event.as_deref() == Some("pace.alert") => alerts += 1,
                Ok(_) => {}
                Err(TryRecvError::Empty) => break,
                Err(_) => break,
            }
        }
        alerts
    }

    #[tokio::test]
    async fn fast_hole_yields_a_negative_delta() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;

        hole_entered(&state, flight_id, boundary(1, 0)).await.unwrap();
        let record = hole_exited(&state, flight_id, boundary(1, 600_000))
            .await
            .unwrap()
            .expect("exit should close the open entry");

        assert_eq!(record.total_time_seconds, 600);
        assert_eq!(record.target_seconds, 840);
        assert_eq!(record.delta_seconds, -240);
        assert!(!record.late);
    }

    #[tokio::test]
    async fn configured_target_overrides_the_fallback() {
        let (state, store) = test_state().await;
        let mut config = PaceConfigEntity::default();
        config.holes.insert(
            2,
            HoleTargetEntity {
                target_minutes: 10,
                par: Some(3),
                stroke_index: None,
            },
        );
        store.seed_pace_config("club_pinetina", "default", config);

        let flight_id = started_flight(&state).await;
        hole_entered(&state, flight_id, boundary(2, 0)).await.unwrap();
        let record = hole_exited(&state, flight_id, boundary(2, 660_000))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.target_seconds, 600);
        assert_eq!(record.delta_seconds, 60);
        assert_eq!(record.par, Some(3));
        assert!(record.late);
    }

    #[tokio::test]
    async fn alert_fires_once_per_threshold_crossing() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;
        let mut monitor = state.monitor_sse().subscribe();

        // Default alert threshold is 12 minutes; one 29-minute hole against
        // the 14-minute fallback puts the flight 15 minutes behind.
        hole_entered(&state, flight_id, boundary(1, 0)).await.unwrap();
        hole_exited(&state, flight_id, boundary(1, 1_740_000)).await.unwrap();
        // Marshall and audio channels are both on by default.
        assert_eq!(count_alerts(&mut monitor), 2);

        // Still above the threshold: the latch suppresses a second alert.
        hole_entered(&state, flight_id, boundary(2, 2_000_000)).await.unwrap();
        hole_exited(&state, flight_id, boundary(2, 3_740_000)).await.unwrap();
        assert_eq!(count_alerts(&mut monitor), 0);
    }

    #[tokio::test]
    async fn alert_rearms_after_recovery_below_the_threshold() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;
        let mut monitor = state.monitor_sse().subscribe();

        hole_entered(&state, flight_id, boundary(1, 0)).await.unwrap();
        hole_exited(&state, flight_id, boundary(1, 1_740_000)).await.unwrap();
        assert_eq!(count_alerts(&mut monitor), 2);

        // A string of fast holes pulls the cumulative delay back under the
        // threshold and re-arms the latch.
        hole_entered(&state, flight_id, boundary(2, 2_000_000)).await.unwrap();
        hole_exited(&state, flight_id, boundary(2, 2_060_000)).await.unwrap();
        assert_eq!(count_alerts(&mut monitor), 0);

        hole_entered(&state, flight_id, boundary(3, 3_000_000)).await.unwrap();
        hole_exited(&state, flight_id, boundary(3, 4_740_000)).await.unwrap();
        assert_eq!(count_alerts(&mut monitor), 2);
    }

    #[tokio::test]
    async fn newer_entry_replaces_an_unclosed_one() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;

        hole_entered(&state, flight_id, boundary(3, 0)).await.unwrap();
        hole_entered(&state, flight_id, boundary(4, 120_000)).await.unwrap();
        let record = hole_exited(&state, flight_id, boundary(4, 720_000))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.hole_number, 4);
        assert_eq!(record.total_time_seconds, 600);

        let tracker = state.require_flight(flight_id).unwrap();
        let timing = tracker.timing().lock().await;
        assert_eq!(timing.dropped_opens, 1);
    }

    #[tokio::test]
    async fn duplicate_entry_keeps_the_earliest_timestamp() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;

        hole_entered(&state, flight_id, boundary(5, 0)).await.unwrap();
        hole_entered(&state, flight_id, boundary(5, 60_000)).await.unwrap();
        let record = hole_exited(&state, flight_id, boundary(5, 600_000))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.total_time_seconds, 600);
    }

    #[tokio::test]
    async fn unmatched_exit_records_nothing() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;

        assert!(hole_exited(&state, flight_id, boundary(9, 0)).await.unwrap().is_none());

        let tracker = state.require_flight(flight_id).unwrap();
        assert!(tracker.timing().lock().await.timeline.is_empty());
    }

    #[tokio::test]
    async fn boundary_events_require_an_active_round() {
        let (state, _store) = test_state().await;
        let flight_id = started_flight(&state).await;
        round_service::request_stop(&state, flight_id).await.unwrap();

        let err = hole_entered(&state, flight_id, boundary(1, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
