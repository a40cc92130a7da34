use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use salesdesk_core::audit::{AuditContext, InMemoryAuditSink};
use salesdesk_core::config::AppConfig;
use salesdesk_core::domain::decision::DecisionBatch;
use salesdesk_core::engine::{SalesEngine, SubmissionRequest};
use salesdesk_core::errors::{ApplicationError, DomainError};
use salesdesk_core::flows::BatchProgress;
use salesdesk_core::rfp::Selection;
use serde_json::json;
use tracing::info;

use crate::commands::{
    load_catalog, read_json, to_data, today_or_now, CommandResult, EXIT_REJECTED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubmitAction {
    /// Save the pricing decision for priced products
    Save,
    /// Raise an RFP for products without approved pricing
    Rfp,
    /// Record both outcomes in one submission
    Both,
}

#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    #[arg(long, help = "JSON file holding one decision batch")]
    pub batch: PathBuf,
    #[arg(long, value_enum, help = "Which outcome to submit")]
    pub action: SubmitAction,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Product indices to save (default: every saveable product)"
    )]
    pub select: Option<Vec<usize>>,
    #[arg(long, help = "JSON array of canonical product names; overrides catalog.path")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Evaluation date (YYYY-MM-DD); defaults to the current UTC date")]
    pub today: Option<NaiveDate>,
    #[arg(long, help = "Correlation id recorded on audit events")]
    pub correlation_id: Option<String>,
    #[arg(
        long,
        help = "JSON file tracking what earlier submissions recorded; created or updated on success"
    )]
    pub progress: Option<PathBuf>,
}

impl SubmitArgs {
    fn request(&self) -> SubmissionRequest {
        let selection = match &self.select {
            Some(indices) => Selection::Indices(indices.clone()),
            None => Selection::AllSaveable,
        };
        match self.action {
            SubmitAction::Save => SubmissionRequest::save(selection),
            SubmitAction::Rfp => SubmissionRequest::raise_rfp(),
            SubmitAction::Both => SubmissionRequest::both(selection),
        }
    }
}

pub fn run(config: &AppConfig, args: &SubmitArgs) -> CommandResult {
    let inputs = read_json::<DecisionBatch>(&args.batch, "batch").and_then(|batch| {
        Ok((batch, load_catalog(config, args.catalog.as_deref())?, load_progress(args)?))
    });
    let (batch, catalog, progress) = match inputs {
        Ok(inputs) => inputs,
        Err(error) => return CommandResult::input_failure("submit", &error),
    };

    let correlation_id =
        args.correlation_id.clone().unwrap_or_else(|| format!("cli-{}", batch.batch_id.0));
    let audit = AuditContext::new(
        Some(batch.batch_id.clone()),
        batch.lead_id.clone(),
        correlation_id.clone(),
        "salesdesk-cli",
    );
    let sink = InMemoryAuditSink::default();
    let engine = SalesEngine::from_config(config, catalog);

    let result = engine.submit(
        &batch,
        &progress,
        &args.request(),
        today_or_now(args.today),
        &sink,
        &audit,
    );
    let audit_events = sink.events();
    for event in &audit_events {
        info!(
            event_name = "cli.audit",
            audit_event = %event.event_type,
            correlation_id = %event.correlation_id,
            outcome = ?event.outcome,
            "audit event recorded"
        );
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(error) => return rejection(error, correlation_id),
    };
    if let Err(error) = store_progress(args, &outcome.progress) {
        return CommandResult::input_failure("submit", &error);
    }

    CommandResult::success_with_data(
        "submit",
        format!(
            "submission {} recorded; batch is {:?}",
            outcome.submission.idempotency_key, outcome.progress.state
        ),
        Some(json!({
            "submission": outcome.submission,
            "state": outcome.progress.state,
            "saved": outcome.progress.saved,
            "actions": outcome.actions,
            "audit": audit_events,
        })),
    )
}

/// A missing progress file means the batch has not been submitted before.
fn load_progress(args: &SubmitArgs) -> anyhow::Result<BatchProgress> {
    match &args.progress {
        Some(path) if path.exists() => read_json(path, "progress"),
        _ => Ok(BatchProgress::default()),
    }
}

fn store_progress(args: &SubmitArgs, progress: &BatchProgress) -> anyhow::Result<()> {
    let Some(path) = &args.progress else {
        return Ok(());
    };
    let raw = serde_json::to_string_pretty(progress)?;
    fs::write(path, raw)
        .with_context(|| format!("could not write progress file `{}`", path.display()))
}

fn rejection(error: DomainError, correlation_id: String) -> CommandResult {
    let (error_class, message, detail) = match &error {
        DomainError::Routing(routing) => {
            ("routing_rejected", routing.user_message().to_string(), to_data(routing))
        }
        DomainError::FlowTransition(_) => ("lifecycle_rejected", error.to_string(), None),
        DomainError::InvariantViolation(_) => ("invalid_submission", error.to_string(), None),
    };
    let interface = ApplicationError::from(error).into_interface(correlation_id);

    CommandResult::failure_with_data(
        "submit",
        error_class,
        message,
        EXIT_REJECTED,
        Some(json!({
            "error": detail,
            "reason": interface.to_string(),
            "correlation_id": interface.correlation_id(),
        })),
    )
}
