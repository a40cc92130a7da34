use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::rfp::router::RoutedBatch;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Draft,
    Routed,
    DecisionRecorded,
    RfpRaised,
    Completed,
    Cancelled,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchEvent {
    BatchRouted,
    DecisionSaved,
    RfpRaised,
    /// Decision and RFP request persisted together in one submission.
    SubmissionRecorded,
    CancelRequested,
}

/// Where a batch stands between submissions: its lifecycle state and the
/// saveable products a recorded decision already covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub state: BatchState,
    #[serde(default)]
    pub saved: BTreeSet<usize>,
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self { state: BatchState::Draft, saved: BTreeSet::new() }
    }
}

/// Partition facts for one transition: saveable products still without a
/// decision, the size of the RFP partition, and the products the event saves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchContext {
    pub unsaved: BTreeSet<usize>,
    pub rfp_required: usize,
    #[serde(default)]
    pub saving: BTreeSet<usize>,
}

impl BatchContext {
    pub fn new(unsaved: impl IntoIterator<Item = usize>, rfp_required: usize) -> Self {
        Self { unsaved: unsaved.into_iter().collect(), rfp_required, saving: BTreeSet::new() }
    }

    pub fn excluding_saved(mut self, saved: &BTreeSet<usize>) -> Self {
        self.unsaved.retain(|index| !saved.contains(index));
        self
    }

    pub fn saving(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.saving = indices.into_iter().collect();
        self
    }

    /// Saveable products left without a decision once `saving` is recorded.
    pub fn remaining_after_save(&self) -> usize {
        self.unsaved.difference(&self.saving).count()
    }
}

impl From<&RoutedBatch> for BatchContext {
    fn from(routed: &RoutedBatch) -> Self {
        Self::new(routed.saveable.iter().map(|product| product.index), routed.rfp_required.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchAction {
    OfferSaveDecision,
    OfferRaiseRfp,
    PersistDecision,
    SubmitRfpRequest,
    PersistSubmission,
    CloseBatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: BatchState,
    pub to: BatchState,
    pub event: BatchEvent,
    pub actions: Vec<BatchAction>,
}
