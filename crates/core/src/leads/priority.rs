use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::lead::Priority;

/// Lower bounds (inclusive) of each tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityThresholds {
    pub critical: u8,
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        super::DEFAULT_THRESHOLDS
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub priority: Priority,
    /// Set when a past-due follow-up date lifted a low score to `Medium`.
    pub stale_follow_up_override: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriorityClassifier {
    thresholds: PriorityThresholds,
}

impl PriorityClassifier {
    pub fn new(thresholds: PriorityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> PriorityThresholds {
        self.thresholds
    }

    pub fn classify(
        &self,
        score: u8,
        follow_up_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Priority {
        self.classify_detailed(score, follow_up_date, today).priority
    }

    pub fn classify_detailed(
        &self,
        score: u8,
        follow_up_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Classification {
        let tier = self.tier(score);

        // Only the sub-medium band is escalated; a stale date never moves a
        // HIGH or CRITICAL lead.
        let stale = follow_up_date.is_some_and(|date| date < today);
        if score < self.thresholds.medium && stale {
            return Classification { priority: Priority::Medium, stale_follow_up_override: true };
        }

        Classification { priority: tier, stale_follow_up_override: false }
    }

    pub fn tier(&self, score: u8) -> Priority {
        let thresholds = &self.thresholds;
        if score >= thresholds.critical {
            Priority::Critical
        } else if score >= thresholds.high {
            Priority::High
        } else if score >= thresholds.medium {
            Priority::Medium
        } else if score >= thresholds.low {
            Priority::Low
        } else {
            Priority::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::PriorityClassifier;
    use crate::domain::lead::Priority;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date")
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).expect("valid date")
    }

    #[test]
    fn tier_boundaries() {
        let classifier = PriorityClassifier::default();
        assert_eq!(classifier.classify(20, None, today()), Priority::Critical);
        assert_eq!(classifier.classify(10, None, today()), Priority::Critical);
        assert_eq!(classifier.classify(9, None, today()), Priority::High);
        assert_eq!(classifier.classify(8, None, today()), Priority::High);
        assert_eq!(classifier.classify(7, None, today()), Priority::Medium);
        assert_eq!(classifier.classify(5, None, today()), Priority::Medium);
        assert_eq!(classifier.classify(4, None, today()), Priority::Low);
        assert_eq!(classifier.classify(1, None, today()), Priority::Low);
        assert_eq!(classifier.classify(0, None, today()), Priority::Ignore);
    }

    #[test]
    fn past_follow_up_date_lifts_low_scores_to_medium() {
        let classifier = PriorityClassifier::default();
        let detailed = classifier.classify_detailed(2, Some(date(19)), today());
        assert_eq!(detailed.priority, Priority::Medium);
        assert!(detailed.stale_follow_up_override);

        assert_eq!(classifier.classify(0, Some(date(1)), today()), Priority::Medium);
    }

    #[test]
    fn follow_up_due_today_or_later_is_not_stale() {
        let classifier = PriorityClassifier::default();
        assert_eq!(classifier.classify(2, Some(today()), today()), Priority::Low);
        assert_eq!(classifier.classify(2, Some(date(25)), today()), Priority::Low);
    }

    #[test]
    fn stale_override_never_touches_medium_and_above() {
        let classifier = PriorityClassifier::default();
        let stale = Some(date(10));
        assert_eq!(classifier.classify(5, stale, today()), Priority::Medium);
        assert_eq!(classifier.classify(8, stale, today()), Priority::High);

        let critical = classifier.classify_detailed(12, stale, today());
        assert_eq!(critical.priority, Priority::Critical);
        assert!(!critical.stale_follow_up_override);
    }

    #[test]
    fn classification_is_repeatable() {
        let classifier = PriorityClassifier::default();
        for score in 0..=20 {
            for follow_up in [None, Some(date(1)), Some(date(31))] {
                assert_eq!(
                    classifier.classify(score, follow_up, today()),
                    classifier.classify(score, follow_up, today())
                );
            }
        }
    }
}
