//! Composition root for the deterministic engines.
//!
//! `SalesEngine` wires the lead prioritizer, the decision router and the
//! batch lifecycle together from one `AppConfig`. It owns no clock; callers
//! pass `today` explicitly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::config::AppConfig;
use crate::domain::decision::DecisionBatch;
use crate::domain::lead::Lead;
use crate::errors::DomainError;
use crate::flows::{
    BatchAction, BatchContext, BatchEvent, BatchProgress, BatchState, DecisionBatchFlow,
    FlowEngine,
};
use crate::leads::{LeadEvaluation, LeadPrioritizer, PriorityCounts};
use crate::rfp::{
    AvailabilityClassifier, Catalog, CatalogAvailabilityClassifier, DecisionAction,
    DecisionRouter, DecisionSubmission, FieldValidator, RoutedBatch, RoutingError, Selection,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRanking {
    pub evaluations: Vec<LeadEvaluation>,
    pub counts: PriorityCounts,
}

/// Which halves of a batch to submit together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub save: Option<Selection>,
    pub raise_rfp: bool,
}

impl SubmissionRequest {
    pub fn save(selection: Selection) -> Self {
        Self { save: Some(selection), raise_rfp: false }
    }

    pub fn raise_rfp() -> Self {
        Self { save: None, raise_rfp: true }
    }

    pub fn both(selection: Selection) -> Self {
        Self { save: Some(selection), raise_rfp: true }
    }

    pub fn is_empty(&self) -> bool {
        self.save.is_none() && !self.raise_rfp
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub submission: DecisionSubmission,
    /// Progress to pass to the next `submit` call for the same batch.
    pub progress: BatchProgress,
    pub actions: Vec<BatchAction>,
}

pub struct SalesEngine<A = CatalogAvailabilityClassifier> {
    prioritizer: LeadPrioritizer,
    router: DecisionRouter<A>,
    flow: FlowEngine<DecisionBatchFlow>,
}

impl SalesEngine<CatalogAvailabilityClassifier> {
    pub fn from_config(config: &AppConfig, catalog: Catalog) -> Self {
        Self::new(
            LeadPrioritizer::new(config.score_calculator(), config.priority_classifier()),
            DecisionRouter::new(
                CatalogAvailabilityClassifier::new(catalog),
                FieldValidator::new(config.validation_limits()),
            ),
        )
    }
}

impl<A> SalesEngine<A>
where
    A: AvailabilityClassifier,
{
    pub fn new(prioritizer: LeadPrioritizer, router: DecisionRouter<A>) -> Self {
        Self { prioritizer, router, flow: FlowEngine::default() }
    }

    pub fn prioritizer(&self) -> &LeadPrioritizer {
        &self.prioritizer
    }

    pub fn router(&self) -> &DecisionRouter<A> {
        &self.router
    }

    pub fn rank_leads(&self, leads: &[Lead], today: NaiveDate) -> LeadRanking {
        let evaluations = self.prioritizer.rank(leads, today);
        let counts = LeadPrioritizer::summarize(&evaluations);
        info!(
            event_name = "engine.lead.ranked",
            total = counts.total(),
            critical = counts.critical,
            high = counts.high,
            "leads ranked"
        );
        LeadRanking { evaluations, counts }
    }

    pub fn route(&self, batch: &DecisionBatch) -> RoutedBatch {
        self.router.route(batch)
    }

    /// Runs every requested action against the batch and records them as a
    /// single submission. Any rejected action rejects the whole submission.
    ///
    /// `progress` is what earlier submissions for this batch recorded; start
    /// from `BatchProgress::default()`. `Selection::AllSaveable` covers only
    /// the saveable products not saved yet.
    pub fn submit<S>(
        &self,
        batch: &DecisionBatch,
        progress: &BatchProgress,
        request: &SubmissionRequest,
        today: NaiveDate,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<SubmissionOutcome, DomainError>
    where
        S: AuditSink,
    {
        let result = self.submit_inner(batch, progress, request, today, sink, audit);
        let event = match &result {
            Ok(outcome) => audit
                .event(
                    "batch.submission_recorded",
                    AuditCategory::Submission,
                    AuditOutcome::Success,
                )
                .with_metadata("idempotency_key", outcome.submission.idempotency_key.clone())
                .with_metadata("state", format!("{:?}", outcome.progress.state)),
            Err(error) => audit
                .event(
                    "batch.submission_rejected",
                    AuditCategory::Submission,
                    AuditOutcome::Rejected,
                )
                .with_metadata("error", error.to_string()),
        };
        sink.emit(event);
        result
    }

    fn submit_inner<S>(
        &self,
        batch: &DecisionBatch,
        progress: &BatchProgress,
        request: &SubmissionRequest,
        today: NaiveDate,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<SubmissionOutcome, DomainError>
    where
        S: AuditSink,
    {
        if request.is_empty() {
            return Err(DomainError::InvariantViolation(
                "submission request names no action".to_string(),
            ));
        }
        if batch.is_empty() {
            return Err(RoutingError::EmptyBatch.into());
        }

        let context =
            BatchContext::from(&self.router.route(batch)).excluding_saved(&progress.saved);
        let current = if progress.state == BatchState::Draft {
            self.flow
                .apply_with_audit(&progress.state, &BatchEvent::BatchRouted, &context, sink, audit)?
                .to
        } else {
            progress.state.clone()
        };

        let decision = request
            .save
            .clone()
            .map(|selection| {
                let selection = match selection {
                    Selection::AllSaveable if !progress.saved.is_empty() => {
                        Selection::Indices(context.unsaved.iter().copied().collect())
                    }
                    selection => selection,
                };
                self.router.execute(batch, &DecisionAction::SaveDecision { selection }, today)
            })
            .transpose()?;
        let rfp_request = request
            .raise_rfp
            .then(|| self.router.execute(batch, &DecisionAction::RaiseRfp, today))
            .transpose()?;

        let event = match (&decision, &rfp_request) {
            (Some(_), Some(_)) => BatchEvent::SubmissionRecorded,
            (Some(_), None) => BatchEvent::DecisionSaved,
            _ => BatchEvent::RfpRaised,
        };
        let saving = decision.as_ref().map(|payload| payload.indices()).unwrap_or_default();
        let context = context.saving(saving.iter().copied());
        let recorded = self.flow.apply_with_audit(&current, &event, &context, sink, audit)?;
        let submission = DecisionSubmission::new(batch, decision, rfp_request)?;

        let mut saved = progress.saved.clone();
        saved.extend(saving);
        Ok(SubmissionOutcome {
            submission,
            progress: BatchProgress { state: recorded.to, saved },
            actions: recorded.actions,
        })
    }
}
