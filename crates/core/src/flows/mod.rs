pub mod engine;
pub mod states;

pub use engine::{DecisionBatchFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use states::{
    BatchAction, BatchContext, BatchEvent, BatchProgress, BatchState, TransitionOutcome,
};
