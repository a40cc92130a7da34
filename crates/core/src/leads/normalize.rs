//! Canonicalization of free-text lead statuses.
//!
//! Upstream records carry statuses typed by hand across several departments:
//! `"Quotation_Sent"`, `"  interested "`, `"Closed - Lost"`. Every input maps
//! to a closed enum variant; nothing here can fail.

use crate::domain::lead::{FollowUpStatus, SalesStatus};

/// Trims, uppercases, and folds `_`, `-` and runs of whitespace into single
/// spaces so that exact-token lookups see one spelling per phrase.
pub fn canonical_key(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .split(|ch: char| ch.is_whitespace() || ch == '_' || ch == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

const FOLLOW_UP_TOKENS: &[(&str, FollowUpStatus)] = &[
    ("APPOINTMENT SCHEDULED", FollowUpStatus::AppointmentScheduled),
    ("MEETING SCHEDULED", FollowUpStatus::AppointmentScheduled),
    ("DEMO SCHEDULED", FollowUpStatus::AppointmentScheduled),
    ("SITE VISIT SCHEDULED", FollowUpStatus::AppointmentScheduled),
    ("QUOTATION SENT", FollowUpStatus::QuotationSent),
    ("QUOTE SENT", FollowUpStatus::QuotationSent),
    ("PROPOSAL SENT", FollowUpStatus::QuotationSent),
    ("INTERESTED", FollowUpStatus::Interested),
    ("HOT", FollowUpStatus::Interested),
    ("CALL BACK", FollowUpStatus::CallBackRequested),
    ("CALLBACK", FollowUpStatus::CallBackRequested),
    ("FOLLOW UP", FollowUpStatus::CallBackRequested),
    ("NO RESPONSE", FollowUpStatus::NoResponse),
    ("NOT REACHABLE", FollowUpStatus::NoResponse),
    ("BUSY", FollowUpStatus::NoResponse),
    ("SWITCHED OFF", FollowUpStatus::NoResponse),
    ("NOT INTERESTED", FollowUpStatus::NotInterested),
];

const SALES_TOKENS: &[(&str, SalesStatus)] = &[
    ("NEGOTIATION", SalesStatus::Negotiation),
    ("PROPOSAL SENT", SalesStatus::ProposalSent),
    ("QUOTATION SENT", SalesStatus::ProposalSent),
    ("QUALIFIED", SalesStatus::Qualified),
    ("CONTACTED", SalesStatus::Contacted),
    ("IN PROGRESS", SalesStatus::Contacted),
    ("NEW", SalesStatus::New),
    ("OPEN", SalesStatus::New),
    ("CLOSED", SalesStatus::Closed),
    ("CLOSED WON", SalesStatus::Closed),
    ("CLOSED LOST", SalesStatus::Closed),
    ("CONVERTED", SalesStatus::Closed),
    ("WON", SalesStatus::Closed),
    ("LOST", SalesStatus::Closed),
    ("DROPPED", SalesStatus::Closed),
    ("DEAD", SalesStatus::Closed),
];

impl FollowUpStatus {
    pub fn normalize(raw: &str) -> Self {
        let key = canonical_key(raw);
        if key.is_empty() {
            return Self::Unknown;
        }

        if let Some((_, status)) = FOLLOW_UP_TOKENS.iter().find(|(token, _)| *token == key) {
            return *status;
        }

        follow_up_from_phrase(&key.to_lowercase())
    }
}

impl SalesStatus {
    pub fn normalize(raw: &str) -> Self {
        let key = canonical_key(raw);
        if key.is_empty() {
            return Self::Unknown;
        }

        if let Some((_, status)) = SALES_TOKENS.iter().find(|(token, _)| *token == key) {
            return *status;
        }

        sales_from_phrase(&key.to_lowercase())
    }
}

/// Words of a lowercased canonical key. Apostrophes stay inside a word so
/// that `won't` never reads as `won`.
struct Words<'a>(Vec<&'a str>);

impl<'a> Words<'a> {
    fn parse(phrase: &'a str) -> Self {
        Self(
            phrase
                .split(|ch: char| !(ch.is_alphanumeric() || ch == '\''))
                .filter(|word| !word.is_empty())
                .collect(),
        )
    }

    fn word(&self, needle: &str) -> bool {
        self.0.iter().any(|word| *word == needle)
    }

    fn prefix(&self, stem: &str) -> bool {
        self.0.iter().any(|word| word.starts_with(stem))
    }

    fn pair(&self, first: &str, second: &str) -> bool {
        self.0.windows(2).any(|pair| pair[0] == first && pair[1] == second)
    }
}

// Order matters: negated and compound phrases must be tested before the bare
// words they contain.
fn follow_up_from_phrase(phrase: &str) -> FollowUpStatus {
    let words = Words::parse(phrase);

    if words.pair("not", "interested") || words.pair("no", "interest") {
        FollowUpStatus::NotInterested
    } else if words.word("scheduled")
        && (words.prefix("appointment")
            || words.prefix("meeting")
            || words.prefix("visit")
            || words.word("demo"))
    {
        FollowUpStatus::AppointmentScheduled
    } else if words.word("sent") && (words.prefix("quot") || words.prefix("proposal")) {
        FollowUpStatus::QuotationSent
    } else if words.word("interested") {
        FollowUpStatus::Interested
    } else if words.pair("call", "back") || words.word("callback") || words.prefix("follow") {
        FollowUpStatus::CallBackRequested
    } else if words.pair("no", "response")
        || words.pair("not", "reachable")
        || words.pair("no", "answer")
        || words.word("busy")
        || words.pair("switched", "off")
    {
        FollowUpStatus::NoResponse
    } else {
        FollowUpStatus::Unknown
    }
}

fn sales_from_phrase(phrase: &str) -> SalesStatus {
    let words = Words::parse(phrase);

    if words.word("closed")
        || words.prefix("convert")
        || words.word("won")
        || words.word("lost")
        || words.prefix("drop")
        || words.word("dead")
    {
        SalesStatus::Closed
    } else if words.prefix("negotiat") {
        SalesStatus::Negotiation
    } else if words.prefix("proposal") || words.prefix("quot") {
        SalesStatus::ProposalSent
    } else if words.word("unqualified") || words.pair("not", "qualified") {
        SalesStatus::Unknown
    } else if words.word("qualified") {
        SalesStatus::Qualified
    } else if words.word("contacted") || words.word("progress") {
        SalesStatus::Contacted
    } else if words.word("new") || words.prefix("open") {
        SalesStatus::New
    } else {
        SalesStatus::Unknown
    }
}
