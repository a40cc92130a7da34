//! Lead prioritization.
//!
//! Scores leads from their status text, assignment age and work progress,
//! then buckets the score into an urgency tier.

mod normalize;
mod priority;
mod scoring;
mod weights;

pub use normalize::canonical_key;
pub use priority::{Classification, PriorityClassifier, PriorityThresholds};
pub use scoring::{delay_penalty, ScoreBreakdown, ScoreCalculator};
pub use weights::MAX_STATUS_WEIGHT;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::lead::{Lead, LeadId, Priority, ScoreResult};

/// Upper bound of any lead score
pub const DEFAULT_SCORE_CAP: u8 = 20;

pub const DEFAULT_THRESHOLDS: PriorityThresholds =
    PriorityThresholds { critical: 10, high: 8, medium: 5, low: 1 };

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadEvaluation {
    pub lead_id: LeadId,
    pub result: ScoreResult,
    pub breakdown: ScoreBreakdown,
    pub stale_follow_up_override: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub ignore: usize,
}

impl PriorityCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.ignore
    }

    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Critical => self.critical += 1,
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
            Priority::Ignore => self.ignore += 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeadPrioritizer {
    calculator: ScoreCalculator,
    classifier: PriorityClassifier,
}

impl LeadPrioritizer {
    pub fn new(calculator: ScoreCalculator, classifier: PriorityClassifier) -> Self {
        Self { calculator, classifier }
    }

    pub fn evaluate(&self, lead: &Lead, today: NaiveDate) -> LeadEvaluation {
        let breakdown = self.calculator.breakdown(lead, today);
        let classification =
            self.classifier.classify_detailed(breakdown.score, lead.follow_up_date, today);

        debug!(
            event_name = "engine.lead.evaluated",
            lead_id = %lead.id.0,
            score = breakdown.score,
            priority = classification.priority.label(),
            stale_override = classification.stale_follow_up_override,
            "lead scored"
        );

        LeadEvaluation {
            lead_id: lead.id.clone(),
            result: ScoreResult { score: breakdown.score, priority: classification.priority },
            breakdown,
            stale_follow_up_override: classification.stale_follow_up_override,
        }
    }

    /// Most urgent first; ties keep score order, then input order.
    pub fn rank(&self, leads: &[Lead], today: NaiveDate) -> Vec<LeadEvaluation> {
        let mut evaluations: Vec<_> = leads.iter().map(|lead| self.evaluate(lead, today)).collect();
        evaluations.sort_by(|a, b| {
            b.result
                .priority
                .cmp(&a.result.priority)
                .then_with(|| b.result.score.cmp(&a.result.score))
        });
        evaluations
    }

    pub fn summarize(evaluations: &[LeadEvaluation]) -> PriorityCounts {
        let mut counts = PriorityCounts::default();
        for evaluation in evaluations {
            counts.record(evaluation.result.priority);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use super::{LeadPrioritizer, PriorityThresholds};
    use crate::domain::lead::{Lead, Priority};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date")
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 9, 30, 0).single().expect("valid time")
            - Duration::days(days)
    }

    #[test]
    fn default_thresholds_match_tier_table() {
        assert_eq!(
            PriorityThresholds::default(),
            PriorityThresholds { critical: 10, high: 8, medium: 5, low: 1 }
        );
    }

    #[test]
    fn worked_negotiation_lead_is_critical() {
        let lead = Lead {
            sales_status: "Negotiation".to_string(),
            follow_up_status: "Quotation Sent".to_string(),
            assigned_at: Some(days_ago(9)),
            first_worked_at: Some(days_ago(7)),
            ..Lead::new("L-neg")
        };

        let evaluation = LeadPrioritizer::default().evaluate(&lead, today());
        assert_eq!(evaluation.result.score, 14);
        assert_eq!(evaluation.result.priority, Priority::Critical);
    }

    #[test]
    fn closed_lead_with_stale_interest_is_only_medium() {
        let lead = Lead {
            sales_status: "Closed".to_string(),
            follow_up_status: "Interested".to_string(),
            assigned_at: Some(days_ago(10)),
            ..Lead::new("L-closed")
        };

        let evaluation = LeadPrioritizer::default().evaluate(&lead, today());
        assert_eq!(evaluation.result.score, 7);
        assert_eq!(evaluation.result.priority, Priority::Medium);
        assert!(!evaluation.stale_follow_up_override);
    }

    #[test]
    fn overdue_follow_up_surfaces_a_quiet_lead() {
        let lead = Lead {
            sales_status: "Closed lost".to_string(),
            follow_up_status: "no response".to_string(),
            follow_up_date: NaiveDate::from_ymd_opt(2026, 3, 18),
            ..Lead::new("L-quiet")
        };

        let evaluation = LeadPrioritizer::default().evaluate(&lead, today());
        assert_eq!(evaluation.result.score, 1);
        assert_eq!(evaluation.result.priority, Priority::Medium);
        assert!(evaluation.stale_follow_up_override);
    }

    #[test]
    fn ranking_orders_by_priority_then_score_then_input() {
        let leads = vec![
            Lead { sales_status: "Closed".to_string(), ..Lead::new("ignore") },
            Lead {
                sales_status: "Negotiation".to_string(),
                follow_up_status: "Interested".to_string(),
                ..Lead::new("critical")
            },
            Lead { sales_status: "New".to_string(), ..Lead::new("medium-a") },
            Lead { sales_status: "New".to_string(), ..Lead::new("medium-b") },
        ];

        let ranked = LeadPrioritizer::default().rank(&leads, today());
        let order: Vec<_> = ranked.iter().map(|evaluation| evaluation.lead_id.0.as_str()).collect();
        assert_eq!(order, vec!["critical", "medium-a", "medium-b", "ignore"]);

        let counts = LeadPrioritizer::summarize(&ranked);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.medium, 2);
        assert_eq!(counts.ignore, 1);
        assert_eq!(counts.total(), 4);
    }
}
