use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Lifecycle phases of a flight's round.
///
/// Telemetry collection is permitted only in [`RoundPhase::Started`];
/// [`RoundPhase::Completed`] is terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Flight is registered but tracking has not begun.
    NotStarted,
    /// Round is active and telemetry is collected.
    Started,
    /// Player requested a stop; waiting for confirmation and persistence.
    /// Not guaranteed transient: a failed close persist keeps the round here.
    Closing,
    /// Backend accepted the final close event. Terminal.
    Completed,
}

/// Events that can be applied to the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Flight-setup confirmation: begin the round and telemetry capture.
    Start,
    /// Player-initiated stop request; confirmation still pending.
    RequestStop,
    /// Finalize the round after the close record has been persisted.
    ConfirmStop,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the invalid event arrived.
    pub from: RoundPhase,
    /// Event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: RoundPhase,
        /// Current phase.
        actual: RoundPhase,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version the plan expected to write.
        expected: usize,
        /// Version that would actually be written.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not yet been applied.
///
/// Side effects (persisting the close record, signalling the capture service)
/// run between `plan` and `apply`; a failed side effect aborts the plan and
/// leaves the phase untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: RoundPhase,
    /// Phase the machine will transition to.
    pub to: RoundPhase,
    /// Event that triggered this transition.
    pub event: RoundEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: RoundPhase,
    /// Version number (increments on each applied transition).
    pub version: usize,
    /// Target phase of a pending transition, if one is planned.
    pub pending: Option<RoundPhase>,
}

/// Per-flight round lifecycle state machine:
/// `not_started → started → closing → completed`.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self {
            phase: RoundPhase::NotStarted,
            version: 0,
            pending: None,
        }
    }
}

impl RoundStateMachine {
    /// Create a new machine in the `not_started` phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Create a snapshot of the machine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Validate that `event` can be applied from the current phase and stage
    /// the transition.
    pub fn plan(&mut self, event: RoundEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let to = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };
        self.pending = Some(plan);

        Ok(plan)
    }

    /// Apply a staged transition, moving the machine to the next phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<RoundPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase)
    }

    /// Discard a staged transition, leaving the phase unchanged.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(&self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (RoundPhase::NotStarted, RoundEvent::Start) => RoundPhase::Started,
            (RoundPhase::Started, RoundEvent::RequestStop) => RoundPhase::Closing,
            (RoundPhase::Closing, RoundEvent::ConfirmStop) => RoundPhase::Completed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut RoundStateMachine, event: RoundEvent) -> RoundPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_phase_is_not_started() {
        let sm = RoundStateMachine::new();
        assert_eq!(sm.phase(), RoundPhase::NotStarted);
    }

    #[test]
    fn full_round_lifecycle() {
        let mut sm = RoundStateMachine::new();

        assert_eq!(apply(&mut sm, RoundEvent::Start), RoundPhase::Started);
        assert_eq!(apply(&mut sm, RoundEvent::RequestStop), RoundPhase::Closing);
        assert_eq!(
            apply(&mut sm, RoundEvent::ConfirmStop),
            RoundPhase::Completed
        );
    }

    #[test]
    fn starting_twice_is_invalid() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::Start);

        let err = sm.plan(RoundEvent::Start).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, RoundPhase::Started);
                assert_eq!(invalid.event, RoundEvent::Start);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn completed_is_terminal() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::Start);
        apply(&mut sm, RoundEvent::RequestStop);
        apply(&mut sm, RoundEvent::ConfirmStop);

        for event in [RoundEvent::Start, RoundEvent::RequestStop, RoundEvent::ConfirmStop] {
            assert!(matches!(
                sm.plan(event),
                Err(PlanError::InvalidTransition(_))
            ));
        }
    }

    #[test]
    fn aborted_confirm_keeps_closing_and_allows_retry() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::Start);
        apply(&mut sm, RoundEvent::RequestStop);

        // Simulate a failed close persist: plan, abort, phase unchanged.
        let plan = sm.plan(RoundEvent::ConfirmStop).unwrap();
        sm.abort(plan.id).unwrap();
        assert_eq!(sm.phase(), RoundPhase::Closing);

        // The retry goes through.
        assert_eq!(
            apply(&mut sm, RoundEvent::ConfirmStop),
            RoundPhase::Completed
        );
    }

    #[test]
    fn stop_request_requires_started() {
        let mut sm = RoundStateMachine::new();
        let err = sm.plan(RoundEvent::RequestStop).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, RoundPhase::NotStarted);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn second_plan_while_pending_is_rejected() {
        let mut sm = RoundStateMachine::new();
        let _plan = sm.plan(RoundEvent::Start).unwrap();
        assert_eq!(sm.plan(RoundEvent::Start), Err(PlanError::AlreadyPending));
    }
}
