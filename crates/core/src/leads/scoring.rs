//! Additive lead scoring.
//!
//! `score = min(cap, follow_up + sales + work_status + delay_penalty)`.
//! Closed leads lose both the sales weight and the work-status weight, so
//! only follow-up and delay can still lift them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lead::{FollowUpStatus, Lead, SalesStatus, WorkStatus};

use super::DEFAULT_SCORE_CAP;

/// Individual scoring components for one lead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub follow_up_status: FollowUpStatus,
    pub sales_status: SalesStatus,
    pub work_status: WorkStatus,
    pub follow_up_weight: u8,
    pub sales_weight: u8,
    pub work_status_weight: u8,
    pub delay_penalty: u8,
    /// Sum before the cap is applied
    pub raw_total: u8,
    pub score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCalculator {
    cap: u8,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self { cap: DEFAULT_SCORE_CAP }
    }

    pub fn with_cap(cap: u8) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> u8 {
        self.cap
    }

    pub fn score(&self, lead: &Lead, today: NaiveDate) -> u8 {
        self.breakdown(lead, today).score
    }

    pub fn breakdown(&self, lead: &Lead, today: NaiveDate) -> ScoreBreakdown {
        let follow_up_status = lead.follow_up_status();
        let sales_status = lead.sales_status();
        let work_status = WorkStatus::derive(sales_status, lead.first_worked_at);

        let follow_up_weight = follow_up_status.weight();
        let sales_weight = sales_status.weight();
        let work_status_weight = work_status.weight();
        let delay_penalty = delay_penalty(lead.assigned_at, today);

        let raw_total = follow_up_weight + sales_weight + work_status_weight + delay_penalty;

        ScoreBreakdown {
            follow_up_status,
            sales_status,
            work_status,
            follow_up_weight,
            sales_weight,
            work_status_weight,
            delay_penalty,
            raw_total,
            score: raw_total.min(self.cap),
        }
    }
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Penalty for time spent assigned: 0 up to one day, 1 up to three, 2 up to
/// seven, 3 beyond. Missing or future assignment dates contribute nothing.
pub fn delay_penalty(assigned_at: Option<DateTime<Utc>>, today: NaiveDate) -> u8 {
    let Some(assigned_at) = assigned_at else {
        return 0;
    };

    match today.signed_duration_since(assigned_at.date_naive()).num_days() {
        days if days <= 1 => 0,
        days if days <= 3 => 1,
        days if days <= 7 => 2,
        _ => 3,
    }
}
