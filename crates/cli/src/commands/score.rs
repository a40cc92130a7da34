use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use salesdesk_core::config::AppConfig;
use salesdesk_core::domain::lead::Lead;
use salesdesk_core::engine::SalesEngine;
use salesdesk_core::rfp::Catalog;

use crate::commands::{read_json, to_data, today_or_now, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct ScoreArgs {
    #[arg(long, help = "JSON file holding an array of leads")]
    pub leads: PathBuf,
    #[arg(long, help = "Evaluation date (YYYY-MM-DD); defaults to the current UTC date")]
    pub today: Option<NaiveDate>,
}

pub fn run(config: &AppConfig, args: &ScoreArgs) -> CommandResult {
    let leads: Vec<Lead> = match read_json(&args.leads, "leads") {
        Ok(leads) => leads,
        Err(error) => return CommandResult::input_failure("score", &error),
    };

    let engine = SalesEngine::from_config(config, Catalog::default());
    let ranking = engine.rank_leads(&leads, today_or_now(args.today));
    let counts = ranking.counts;

    CommandResult::success_with_data(
        "score",
        format!(
            "{} leads ranked ({} critical, {} high, {} medium, {} low, {} ignore)",
            counts.total(),
            counts.critical,
            counts.high,
            counts.medium,
            counts.low,
            counts.ignore
        ),
        to_data(&ranking),
    )
}
