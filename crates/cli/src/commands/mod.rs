pub mod config;
pub mod route;
pub mod score;
pub mod submit;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use salesdesk_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use salesdesk_core::rfp::Catalog;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_REJECTED: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_data(command, error_class, message, exit_code, None)
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        Self::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    }

    pub fn input_failure(command: &str, error: &anyhow::Error) -> Self {
        Self::failure(command, "input", format!("{error:#}"), EXIT_INPUT)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn to_data(value: &impl Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}

pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let require_file = config_path.is_some();
    AppConfig::load(LoadOptions {
        config_path,
        require_file,
        overrides: ConfigOverrides::default(),
    })
}

pub(crate) fn read_json<T>(path: &Path, what: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read {what} file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse {what} file `{}`", path.display()))
}

/// Inline `catalog.products` merged with the names in the catalog file. An
/// explicit path wins over `catalog.path`.
pub(crate) fn load_catalog(
    config: &AppConfig,
    explicit: Option<&Path>,
) -> anyhow::Result<Catalog> {
    let mut catalog = config.inline_catalog();
    if let Some(path) = explicit.or(config.catalog.path.as_deref()) {
        let names: Vec<String> = read_json(path, "catalog")?;
        catalog.extend(names);
    }
    Ok(catalog)
}

pub(crate) fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Utc::now().date_naive())
}
