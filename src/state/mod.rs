pub mod flight;
pub mod round;
mod sse;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::pace_store::PaceStore,
    error::ServiceError,
    services::capture::{CaptureControl, SseCaptureControl},
    state::{
        flight::FlightTracker,
        round::{AbortError, ApplyError, Plan, PlanError, PlanId, RoundEvent, RoundPhase},
    },
};

pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Default wall-clock budget for a lifecycle transition's side effects.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: storage handle, flight registry, SSE hubs, and
/// the capture control port.
pub struct AppState {
    config: AppConfig,
    pace_store: RwLock<Option<Arc<dyn PaceStore>>>,
    sse: sse::SseState,
    flights: DashMap<Uuid, Arc<FlightTracker>>,
    capture: Arc<dyn CaptureControl>,
    degraded: watch::Sender<bool>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct the state wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed. Capture control defaults to signalling devices over the
    /// player SSE stream.
    pub fn new(config: AppConfig) -> SharedState {
        let sse = sse::SseState::new(32, 32);
        let capture = Arc::new(SseCaptureControl::new(sse.player().clone()));
        Self::assemble(config, sse, capture)
    }

    /// Construct the state with a custom capture control implementation.
    /// Used by tests to observe native start/stop signals.
    pub fn with_capture(config: AppConfig, capture: Arc<dyn CaptureControl>) -> SharedState {
        let sse = sse::SseState::new(32, 32);
        Self::assemble(config, sse, capture)
    }

    fn assemble(
        config: AppConfig,
        sse: sse::SseState,
        capture: Arc<dyn CaptureControl>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            pace_store: RwLock::new(None),
            sse,
            flights: DashMap::new(),
            capture,
            degraded: degraded_tx,
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current pace store, if one is installed.
    pub async fn pace_store(&self) -> Option<Arc<dyn PaceStore>> {
        let guard = self.pace_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the pace store or fail with [`ServiceError::Degraded`].
    pub async fn require_pace_store(&self) -> Result<Arc<dyn PaceStore>, ServiceError> {
        self.pace_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_pace_store(&self, store: Arc<dyn PaceStore>) {
        {
            let mut guard = self.pace_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the storage backend and enter degraded mode.
    pub async fn clear_pace_store(&self) {
        {
            let mut guard = self.pace_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag. Tracks storage health, not just presence: the
    /// supervisor raises it while reconnect attempts are in flight.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub for the player-facing SSE stream.
    pub fn player_sse(&self) -> &SseHub {
        self.sse.player()
    }

    /// Broadcast hub for the monitoring SSE stream.
    pub fn monitor_sse(&self) -> &SseHub {
        self.sse.monitor()
    }

    /// Capture control port for the background location service.
    pub fn capture(&self) -> &dyn CaptureControl {
        self.capture.as_ref()
    }

    /// Register a flight tracker, returning the shared handle.
    pub fn register_flight(&self, tracker: FlightTracker) -> Arc<FlightTracker> {
        let tracker = Arc::new(tracker);
        self.flights.insert(tracker.session().id, tracker.clone());
        tracker
    }

    /// Look up a flight tracker by id.
    pub fn flight(&self, id: Uuid) -> Option<Arc<FlightTracker>> {
        self.flights.get(&id).map(|entry| entry.value().clone())
    }

    /// Look up a flight tracker or fail with [`ServiceError::NotFound`].
    pub fn require_flight(&self, id: Uuid) -> Result<Arc<FlightTracker>, ServiceError> {
        self.flight(id)
            .ok_or_else(|| ServiceError::NotFound(format!("flight `{id}` is not registered")))
    }

    /// Find a flight by its session code, ignoring completed rounds.
    pub async fn flight_by_session_code(&self, session_code: &str) -> Option<Arc<FlightTracker>> {
        for entry in self.flights.iter() {
            let tracker = entry.value().clone();
            if tracker.session().session_code == session_code
                && tracker.phase().await != RoundPhase::Completed
            {
                return Some(tracker);
            }
        }
        None
    }

    /// Run a lifecycle transition for one flight: plan, execute the side
    /// effect, then apply. A failed or timed-out side effect aborts the plan
    /// so the phase is left untouched (e.g. a failed close persist keeps the
    /// round in `closing`).
    pub async fn run_transition<F, Fut, T>(
        &self,
        tracker: &FlightTracker,
        event: RoundEvent,
        work: F,
    ) -> Result<(T, RoundPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let _gate = tracker.transition_gate().lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(tracker, event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    self.abort_transition(tracker, plan_id, event, "timeout").await;
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_transition(tracker, plan_id).await?;
                Ok((value, next))
            }
            Err(err) => {
                self.abort_transition(tracker, plan_id, event, "work error").await;
                Err(err)
            }
        }
    }

    async fn plan_transition(
        &self,
        tracker: &FlightTracker,
        event: RoundEvent,
    ) -> Result<Plan, PlanError> {
        let mut machine = tracker.machine().lock().await;
        machine.plan(event)
    }

    async fn apply_transition(
        &self,
        tracker: &FlightTracker,
        plan_id: PlanId,
    ) -> Result<RoundPhase, ApplyError> {
        let mut machine = tracker.machine().lock().await;
        machine.apply(plan_id)
    }

    async fn abort_transition(
        &self,
        tracker: &FlightTracker,
        plan_id: PlanId,
        event: RoundEvent,
        reason: &str,
    ) {
        let mut machine = tracker.machine().lock().await;
        if let Err(abort_err) = machine.abort(plan_id) {
            let abort_err: AbortError = abort_err;
            warn!(
                flight_id = %tracker.session().id,
                event = ?event,
                plan_id = %plan_id,
                error = ?abort_err,
                reason,
                "failed to abort lifecycle transition"
            );
        }
    }
}
