use std::path::PathBuf;

use clap::Args;
use salesdesk_core::config::AppConfig;
use salesdesk_core::domain::decision::DecisionBatch;
use salesdesk_core::engine::SalesEngine;
use salesdesk_core::rfp::RoutingError;
use tracing::info;

use crate::commands::{load_catalog, read_json, to_data, CommandResult, EXIT_REJECTED};

#[derive(Debug, Clone, Args)]
pub struct RouteArgs {
    #[arg(long, help = "JSON file holding one decision batch")]
    pub batch: PathBuf,
    #[arg(long, help = "JSON array of canonical product names; overrides catalog.path")]
    pub catalog: Option<PathBuf>,
}

pub fn run(config: &AppConfig, args: &RouteArgs) -> CommandResult {
    let inputs = read_json::<DecisionBatch>(&args.batch, "batch")
        .and_then(|batch| Ok((batch, load_catalog(config, args.catalog.as_deref())?)));
    let (batch, catalog) = match inputs {
        Ok(inputs) => inputs,
        Err(error) => return CommandResult::input_failure("route", &error),
    };

    if batch.is_empty() {
        let error = RoutingError::EmptyBatch;
        return CommandResult::failure_with_data(
            "route",
            "routing_rejected",
            error.user_message(),
            EXIT_REJECTED,
            to_data(&error),
        );
    }

    let routed = SalesEngine::from_config(config, catalog).route(&batch);
    info!(
        event_name = "cli.route.completed",
        batch_id = %routed.batch_id.0,
        saveable = routed.saveable.len(),
        rfp_required = routed.rfp_required.len(),
        "batch routed"
    );

    CommandResult::success_with_data(
        "route",
        format!(
            "{} saveable, {} need RFP",
            routed.saveable.len(),
            routed.rfp_required.len()
        ),
        to_data(&routed),
    )
}
