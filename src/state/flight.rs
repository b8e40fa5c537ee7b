use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    dao::models::HoleTimingEntity,
    services::capture::CaptureControl,
    state::round::{RoundPhase, RoundStateMachine, Snapshot},
};

/// Immutable registration data for a flight (a group of players sharing one
/// round).
#[derive(Debug, Clone)]
pub struct FlightSession {
    /// Primary key of the flight.
    pub id: Uuid,
    /// Display number shown to staff.
    pub flight_number: u32,
    /// Club the flight belongs to.
    pub club_id: String,
    /// Course the flight is playing.
    pub course_id: String,
    /// Join code shared between the flight's players.
    pub session_code: String,
    /// Scheduled tee time, kept verbatim for display.
    pub tee_time: String,
    /// Registered players.
    pub players: Vec<PlayerRef>,
}

/// Minimal reference to a player inside a flight.
#[derive(Debug, Clone)]
pub struct PlayerRef {
    /// Player identifier, when the client is authenticated.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
}

/// One hole traversed by one flight; immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleTimingRecord {
    /// Hole number (1-18).
    pub hole_number: u8,
    /// Par, when the pace configuration carries it.
    pub par: Option<u8>,
    /// Stroke index, when the pace configuration carries it.
    pub stroke_index: Option<u8>,
    /// Configured target duration in seconds.
    pub target_seconds: i64,
    /// Measured duration in whole seconds.
    pub total_time_seconds: i64,
    /// `total_time_seconds - target_seconds`; positive means late.
    pub delta_seconds: i64,
}

impl HoleTimingRecord {
    /// Binary late flag; the warning/alert thresholds only drive notification
    /// triggers, not a three-way per-hole status.
    pub fn late(&self) -> bool {
        self.delta_seconds > 0
    }
}

impl From<HoleTimingRecord> for HoleTimingEntity {
    fn from(value: HoleTimingRecord) -> Self {
        Self {
            hole_number: value.hole_number,
            par: value.par,
            stroke_index: value.stroke_index,
            target_seconds: value.target_seconds,
            total_time_seconds: value.total_time_seconds,
            delta_seconds: value.delta_seconds,
        }
    }
}

/// An "enter hole" boundary waiting for its matching exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenHoleEntry {
    /// Hole that was entered.
    pub hole_number: u8,
    /// Device timestamp of the enter boundary, epoch milliseconds.
    pub entered_at_ms: i64,
}

/// Mutable timing state reduced from boundary events.
#[derive(Debug, Default)]
pub struct TimingState {
    /// Currently open entry, at most one per flight.
    pub open_entry: Option<OpenHoleEntry>,
    /// Diagnostic counter for entries discarded by last-enter-wins.
    pub dropped_opens: u64,
    /// Sum of deltas over all recorded holes, seconds. May be negative.
    pub cumulative_delay_seconds: i64,
    /// Latch ensuring pace alerts fire once per threshold crossing.
    pub alert_latched: bool,
    /// Append-only timeline of recorded holes.
    pub timeline: Vec<HoleTimingRecord>,
}

/// Runtime state for one tracked flight: lifecycle machine, capture guard,
/// throttle gate, and timing reduction state.
pub struct FlightTracker {
    session: FlightSession,
    machine: Mutex<RoundStateMachine>,
    /// Guard flag for the physical capture service. Updated under the same
    /// lock as the native start/stop signal so concurrent state-change
    /// triggers cannot double-start or double-stop the service.
    capture_running: Mutex<bool>,
    /// Device timestamp of the last forwarded sample. Assumes in-order
    /// delivery from the capture source.
    last_forwarded_ms: Mutex<Option<i64>>,
    timing: Mutex<TimingState>,
    /// Serializes plan/work/apply sequences for this flight.
    transition_gate: Mutex<()>,
}

impl FlightTracker {
    /// Create a tracker in the `not_started` phase.
    pub fn new(session: FlightSession) -> Self {
        Self {
            session,
            machine: Mutex::new(RoundStateMachine::new()),
            capture_running: Mutex::new(false),
            last_forwarded_ms: Mutex::new(None),
            timing: Mutex::new(TimingState::default()),
            transition_gate: Mutex::new(()),
        }
    }

    /// Registration data for this flight.
    pub fn session(&self) -> &FlightSession {
        &self.session
    }

    /// Current lifecycle phase, re-read on every call (never cached by
    /// long-lived listeners).
    pub async fn phase(&self) -> RoundPhase {
        self.machine.lock().await.phase()
    }

    /// Snapshot of the lifecycle machine.
    pub async fn lifecycle_snapshot(&self) -> Snapshot {
        self.machine.lock().await.snapshot()
    }

    /// Exclusive access to the lifecycle machine.
    pub fn machine(&self) -> &Mutex<RoundStateMachine> {
        &self.machine
    }

    /// Gate serializing transitions for this flight.
    pub fn transition_gate(&self) -> &Mutex<()> {
        &self.transition_gate
    }

    /// Exclusive access to the timing reduction state.
    pub fn timing(&self) -> &Mutex<TimingState> {
        &self.timing
    }

    /// Whether the physical capture service is currently running.
    pub async fn capture_running(&self) -> bool {
        *self.capture_running.lock().await
    }

    /// Signal capture start unless it is already running. Returns whether a
    /// native start was actually issued.
    pub async fn ensure_capture_started(&self, capture: &dyn CaptureControl) -> bool {
        let mut running = self.capture_running.lock().await;
        if *running {
            return false;
        }
        capture.start(self.session.id);
        *running = true;
        true
    }

    /// Signal capture stop unless it is already stopped. Returns whether a
    /// native stop was actually issued.
    pub async fn ensure_capture_stopped(&self, capture: &dyn CaptureControl) -> bool {
        let mut running = self.capture_running.lock().await;
        if !*running {
            return false;
        }
        capture.stop(self.session.id);
        *running = false;
        true
    }

    /// Leaky throttle gate: claim the forward slot when `now_ms` is outside
    /// the window since the last forwarded sample. In-window samples are
    /// dropped by the caller, never queued.
    pub async fn try_claim_forward_slot(&self, now_ms: i64, window_ms: i64) -> bool {
        let mut last = self.last_forwarded_ms.lock().await;
        match *last {
            Some(previous) if now_ms - previous < window_ms => false,
            _ => {
                *last = Some(now_ms);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> FlightSession {
        FlightSession {
            id: Uuid::new_v4(),
            flight_number: 7,
            club_id: "club_pinetina".into(),
            course_id: "default".into(),
            session_code: "A1B2".into(),
            tee_time: "2026-08-23T08:30:00Z".into(),
            players: vec![PlayerRef {
                id: None,
                name: "Guest Player".into(),
            }],
        }
    }

    #[tokio::test]
    async fn throttle_gate_drops_samples_inside_window() {
        let tracker = FlightTracker::new(session());
        let window = 10_000;

        assert!(tracker.try_claim_forward_slot(0, window).await);
        assert!(!tracker.try_claim_forward_slot(3_000, window).await);
        assert!(!tracker.try_claim_forward_slot(7_000, window).await);
        assert!(tracker.try_claim_forward_slot(11_000, window).await);
    }

    #[tokio::test]
    async fn first_sample_always_claims_the_slot() {
        let tracker = FlightTracker::new(session());
        assert!(tracker.try_claim_forward_slot(5, 10_000).await);
    }
}
