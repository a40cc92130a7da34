use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

/// A sales prospect as supplied by the lead data source.
///
/// Status fields stay as raw text; they are canonicalized on read by
/// [`FollowUpStatus::normalize`] and [`SalesStatus::normalize`]. Ingestion
/// never rejects a record: nulls, wrong types and unparseable dates all
/// degrade to empty text or `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: LeadId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sales_status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub follow_up_status: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub first_worked_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: LeadId(id.into()),
            sales_status: String::new(),
            follow_up_status: String::new(),
            follow_up_date: None,
            assigned_at: None,
            first_worked_at: None,
        }
    }

    pub fn follow_up_status(&self) -> FollowUpStatus {
        FollowUpStatus::normalize(&self.follow_up_status)
    }

    pub fn sales_status(&self) -> SalesStatus {
        SalesStatus::normalize(&self.sales_status)
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<LeadId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(LeadId(match raw {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => text,
        _ => String::new(),
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_text(deserializer)?.and_then(|text| {
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(&text).ok().map(|at| at.date_naive()))
    }))
}

/// RFC 3339 timestamps, or a bare `YYYY-MM-DD` read as midnight UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_text(deserializer)?.and_then(|text| {
        DateTime::parse_from_rfc3339(&text).map(|at| at.with_timezone(&Utc)).ok().or_else(|| {
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
        })
    }))
}

fn raw_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStatus {
    AppointmentScheduled,
    QuotationSent,
    Interested,
    CallBackRequested,
    NoResponse,
    NotInterested,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesStatus {
    Negotiation,
    ProposalSent,
    Qualified,
    Contacted,
    New,
    Closed,
    Unknown,
}

impl SalesStatus {
    /// Closed, converted, won, lost and dropped leads all collapse here.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Done,
    Working,
    NotStarted,
}

impl WorkStatus {
    pub fn derive(sales_status: SalesStatus, first_worked_at: Option<DateTime<Utc>>) -> Self {
        if sales_status.is_closed() {
            Self::Done
        } else if first_worked_at.is_some() {
            Self::Working
        } else {
            Self::NotStarted
        }
    }
}

/// Urgency tier. Ordering follows urgency: `Critical` is the greatest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Ignore,
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Ignore => "IGNORE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub priority: Priority,
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{Lead, LeadId, Priority, SalesStatus, WorkStatus};

    #[test]
    fn closed_leads_are_done_even_after_work_started() {
        let status = WorkStatus::derive(SalesStatus::Closed, Some(Utc::now()));
        assert_eq!(status, WorkStatus::Done);
    }

    #[test]
    fn work_status_tracks_first_worked_at() {
        assert_eq!(WorkStatus::derive(SalesStatus::New, Some(Utc::now())), WorkStatus::Working);
        assert_eq!(WorkStatus::derive(SalesStatus::New, None), WorkStatus::NotStarted);
    }

    #[test]
    fn priority_orders_by_urgency() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::Low > Priority::Ignore);
    }

    #[test]
    fn lead_deserializes_with_missing_optional_fields() {
        let lead: Lead = serde_json::from_str(r#"{"id":"L-1","salesStatus":"Negotiation"}"#)
            .expect("lead json");
        assert_eq!(lead.sales_status, "Negotiation");
        assert!(lead.follow_up_status.is_empty());
        assert!(lead.assigned_at.is_none());
    }

    #[test]
    fn null_and_non_string_statuses_degrade_to_empty_text() {
        let lead: Lead =
            serde_json::from_str(r#"{"id":"L1","salesStatus":null,"followUpStatus":42}"#)
                .expect("lead json");
        assert!(lead.sales_status.is_empty());
        assert!(lead.follow_up_status.is_empty());
        assert_eq!(lead.sales_status(), SalesStatus::Unknown);
    }

    #[test]
    fn missing_or_null_id_defaults_to_empty() {
        let lead: Lead = serde_json::from_str(r#"{"salesStatus":"New"}"#).expect("lead json");
        assert_eq!(lead.id, LeadId::default());
        assert_eq!(lead.sales_status(), SalesStatus::New);

        let lead: Lead = serde_json::from_str(r#"{"id":null}"#).expect("lead json");
        assert!(lead.id.0.is_empty());

        let lead: Lead = serde_json::from_str(r#"{"id":1042}"#).expect("lead json");
        assert_eq!(lead.id.0, "1042");
    }

    #[test]
    fn date_only_assigned_at_reads_as_midnight_utc() {
        let lead: Lead = serde_json::from_str(
            r#"{"assignedAt":"2026-03-10","firstWorkedAt":"2026-03-11T08:15:00+05:30"}"#,
        )
        .expect("lead json");
        assert_eq!(lead.assigned_at, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).single());
        assert_eq!(lead.first_worked_at, Utc.with_ymd_and_hms(2026, 3, 11, 2, 45, 0).single());
    }

    #[test]
    fn blank_or_unparseable_dates_become_none() {
        let lead: Lead = serde_json::from_str(
            r#"{"followUpDate":"","assignedAt":"next tuesday","firstWorkedAt":17}"#,
        )
        .expect("lead json");
        assert!(lead.follow_up_date.is_none());
        assert!(lead.assigned_at.is_none());
        assert!(lead.first_worked_at.is_none());

        let lead: Lead =
            serde_json::from_str(r#"{"followUpDate":"2026-03-18T10:00:00Z"}"#).expect("lead json");
        assert_eq!(lead.follow_up_date, NaiveDate::from_ymd_opt(2026, 3, 18));
    }
}
