use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use salesdesk_core::config::AppConfig;
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, to_data, CommandResult};

#[derive(Debug, Serialize)]
struct EffectiveValue {
    value: String,
    source: String,
}

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(config_path.map(Path::to_path_buf)) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure("config", &error),
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut values = BTreeMap::new();
    let mut record = |key: &str, value: String, env_keys: &[&str]| {
        values.insert(key.to_string(), EffectiveValue { value, source: source(key, env_keys) });
    };

    record(
        "logging.level",
        config.logging.level.clone(),
        &["SALESDESK_LOGGING_LEVEL", "SALESDESK_LOG_LEVEL"],
    );
    record(
        "logging.format",
        format!("{:?}", config.logging.format).to_ascii_lowercase(),
        &["SALESDESK_LOGGING_FORMAT", "SALESDESK_LOG_FORMAT"],
    );
    record(
        "scoring.critical_threshold",
        config.scoring.critical_threshold.to_string(),
        &["SALESDESK_SCORING_CRITICAL_THRESHOLD"],
    );
    record(
        "scoring.high_threshold",
        config.scoring.high_threshold.to_string(),
        &["SALESDESK_SCORING_HIGH_THRESHOLD"],
    );
    record(
        "scoring.medium_threshold",
        config.scoring.medium_threshold.to_string(),
        &["SALESDESK_SCORING_MEDIUM_THRESHOLD"],
    );
    record(
        "scoring.low_threshold",
        config.scoring.low_threshold.to_string(),
        &["SALESDESK_SCORING_LOW_THRESHOLD"],
    );
    record(
        "scoring.score_cap",
        config.scoring.score_cap.to_string(),
        &["SALESDESK_SCORING_SCORE_CAP"],
    );
    record(
        "validation.max_product_spec_chars",
        config.validation.max_product_spec_chars.to_string(),
        &["SALESDESK_VALIDATION_MAX_PRODUCT_SPEC_CHARS"],
    );
    record(
        "validation.max_length",
        config.validation.max_length.to_string(),
        &["SALESDESK_VALIDATION_MAX_LENGTH"],
    );
    record(
        "catalog.path",
        config
            .catalog
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unset>".to_string()),
        &["SALESDESK_CATALOG_PATH"],
    );
    record("catalog.products", format!("{} inline products", config.catalog.products.len()), &[]);

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        to_data(&values),
    )
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("salesdesk.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/salesdesk.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::contains_path;

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: toml::Value = "[scoring]\nscore_cap = 18\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "scoring.score_cap"));
        assert!(!contains_path(&doc, "scoring.low_threshold"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
