use thiserror::Error;
use tracing::debug;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{BatchAction, BatchContext, BatchEvent, BatchState, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_state(&self) -> BatchState;
    fn transition(
        &self,
        current: &BatchState,
        event: &BatchEvent,
        context: &BatchContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Lifecycle of one decision batch: routed once, then each half (saved
/// decision, raised RFP) is submitted at most once.
#[derive(Clone, Debug, Default)]
pub struct DecisionBatchFlow;

impl FlowDefinition for DecisionBatchFlow {
    fn initial_state(&self) -> BatchState {
        BatchState::Draft
    }

    fn transition(
        &self,
        current: &BatchState,
        event: &BatchEvent,
        context: &BatchContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_decision_batch(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> BatchState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &BatchState,
        event: &BatchEvent,
        context: &BatchContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        let result = self.flow.transition(current, event, context);
        debug!(
            event_name = "engine.batch.transition",
            from = ?current,
            batch_event = ?event,
            accepted = result.is_ok(),
            "batch transition evaluated"
        );
        result
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &BatchState,
        event: &BatchEvent,
        context: &BatchContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink,
    {
        let result = self.apply(current, event, context);
        let event = match &result {
            Ok(outcome) => audit
                .event("batch.transition_applied", AuditCategory::Flow, AuditOutcome::Success)
                .with_metadata("from", format!("{:?}", outcome.from))
                .with_metadata("to", format!("{:?}", outcome.to))
                .with_metadata("event", format!("{:?}", outcome.event)),
            Err(error) => audit
                .event("batch.transition_rejected", AuditCategory::Flow, AuditOutcome::Rejected)
                .with_metadata("error", error.to_string()),
        };
        sink.emit(event);
        result
    }
}

impl Default for FlowEngine<DecisionBatchFlow> {
    fn default() -> Self {
        Self::new(DecisionBatchFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("batch has no products to route")]
    EmptyBatch,
    #[error("{event:?} has no products to act on in state {state:?}")]
    NothingToSubmit { state: BatchState, event: BatchEvent },
    #[error("products {indices:?} already have a saved decision")]
    AlreadySaved { indices: Vec<usize> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: BatchState, event: BatchEvent },
}

fn transition_decision_batch(
    current: &BatchState,
    event: &BatchEvent,
    context: &BatchContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use BatchAction::{
        CloseBatch, OfferRaiseRfp, OfferSaveDecision, PersistDecision, PersistSubmission,
        SubmitRfpRequest,
    };
    use BatchEvent::{BatchRouted, CancelRequested, DecisionSaved, RfpRaised, SubmissionRecorded};
    use BatchState::{Cancelled, Completed, DecisionRecorded, Draft, Routed};

    let nothing_to_submit = || FlowTransitionError::NothingToSubmit {
        state: current.clone(),
        event: event.clone(),
    };
    let check_saving = || {
        if context.saving.is_empty() {
            return Err(nothing_to_submit());
        }
        let repeated: Vec<usize> = context.saving.difference(&context.unsaved).copied().collect();
        if repeated.is_empty() {
            Ok(())
        } else {
            Err(FlowTransitionError::AlreadySaved { indices: repeated })
        }
    };
    let rfp_pending = context.rfp_required > 0 && *current != BatchState::RfpRaised;

    let (to, actions) = match (current, event) {
        (Draft, BatchRouted) => {
            if context.unsaved.is_empty() && context.rfp_required == 0 {
                return Err(FlowTransitionError::EmptyBatch);
            }
            let mut actions = Vec::new();
            if !context.unsaved.is_empty() {
                actions.push(OfferSaveDecision);
            }
            if context.rfp_required > 0 {
                actions.push(OfferRaiseRfp);
            }
            (Routed, actions)
        }
        (Routed | DecisionRecorded | BatchState::RfpRaised, DecisionSaved) => {
            check_saving()?;
            if context.remaining_after_save() == 0 && !rfp_pending {
                (Completed, vec![PersistDecision, CloseBatch])
            } else if *current == BatchState::RfpRaised {
                (BatchState::RfpRaised, vec![PersistDecision])
            } else {
                (DecisionRecorded, vec![PersistDecision])
            }
        }
        (Routed | DecisionRecorded, RfpRaised) => {
            if context.rfp_required == 0 {
                return Err(nothing_to_submit());
            }
            if context.unsaved.is_empty() {
                (Completed, vec![SubmitRfpRequest, CloseBatch])
            } else {
                (BatchState::RfpRaised, vec![SubmitRfpRequest])
            }
        }
        (Routed | DecisionRecorded, SubmissionRecorded) => {
            if context.rfp_required == 0 {
                return Err(nothing_to_submit());
            }
            check_saving()?;
            if context.remaining_after_save() == 0 {
                (Completed, vec![PersistSubmission, CloseBatch])
            } else {
                (BatchState::RfpRaised, vec![PersistSubmission])
            }
        }
        (state, CancelRequested) if !state.is_terminal() => (Cancelled, Vec::new()),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), actions })
}
