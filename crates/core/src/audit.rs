//! Audit trail for batch lifecycle transitions and submissions.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::decision::BatchId;
use crate::domain::lead::LeadId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Flow,
    Submission,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Rejected,
}

/// Who is acting on which batch; stamped onto every event it creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditContext {
    pub batch_id: Option<BatchId>,
    pub lead_id: Option<LeadId>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        batch_id: Option<BatchId>,
        lead_id: Option<LeadId>,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self { batch_id, lead_id, correlation_id: correlation_id.into(), actor: actor.into() }
    }

    pub fn event(
        &self,
        event_type: &str,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent {
            event_id: Uuid::new_v4(),
            batch_id: self.batch_id.clone(),
            lead_id: self.lead_id.clone(),
            correlation_id: self.correlation_id.clone(),
            actor: self.actor.clone(),
            event_type: event_type.to_string(),
            category,
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub batch_id: Option<BatchId>,
    pub lead_id: Option<LeadId>,
    pub correlation_id: String,
    pub actor: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Collects events for the CLI report and tests.
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditCategory, AuditContext, AuditOutcome, AuditSink, InMemoryAuditSink};
    use crate::domain::{decision::BatchId, lead::LeadId};

    #[test]
    fn events_carry_batch_and_lead_from_the_context() {
        let sink = InMemoryAuditSink::default();
        let context = AuditContext::new(
            Some(BatchId("B-2026-0042".to_owned())),
            Some(LeadId("L-311".to_owned())),
            "req-123",
            "decision-router",
        );
        sink.emit(
            context
                .event("batch.transition_applied", AuditCategory::Flow, AuditOutcome::Success)
                .with_metadata("from", "Routed")
                .with_metadata("to", "RfpRaised"),
        );
        sink.emit(context.event(
            "batch.submission_rejected",
            AuditCategory::Submission,
            AuditOutcome::Rejected,
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].correlation_id, "req-123");
        assert_eq!(events[0].lead_id.as_ref().map(|id| id.0.as_str()), Some("L-311"));
        assert_eq!(events[0].batch_id.as_ref().map(|id| id.0.as_str()), Some("B-2026-0042"));
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("RfpRaised"));
        assert_ne!(events[0].event_id, events[1].event_id);

        let json = serde_json::to_value(&events[1]).expect("event json");
        assert_eq!(json["category"], "submission");
        assert_eq!(json["outcome"], "rejected");
    }
}
