use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leads::{PriorityClassifier, PriorityThresholds, ScoreCalculator, DEFAULT_SCORE_CAP};
use crate::rfp::{Catalog, ValidationLimits};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub scoring: ScoringConfig,
    pub validation: ValidationConfig,
    pub catalog: CatalogConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScoringConfig {
    pub critical_threshold: u8,
    pub high_threshold: u8,
    pub medium_threshold: u8,
    pub low_threshold: u8,
    pub score_cap: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationConfig {
    pub max_product_spec_chars: usize,
    pub max_length: u32,
}

/// Canonical product names. `path` points at a JSON array of names that the
/// CLI merges with the inline `products` list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    pub products: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub catalog_path: Option<PathBuf>,
    pub score_cap: Option<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let thresholds = PriorityThresholds::default();
        let limits = ValidationLimits::default();
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            scoring: ScoringConfig {
                critical_threshold: thresholds.critical,
                high_threshold: thresholds.high,
                medium_threshold: thresholds.medium,
                low_threshold: thresholds.low,
                score_cap: DEFAULT_SCORE_CAP,
            },
            validation: ValidationConfig {
                max_product_spec_chars: limits.max_product_spec_chars,
                max_length: limits.max_length,
            },
            catalog: CatalogConfig::default(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("salesdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn thresholds(&self) -> PriorityThresholds {
        PriorityThresholds {
            critical: self.scoring.critical_threshold,
            high: self.scoring.high_threshold,
            medium: self.scoring.medium_threshold,
            low: self.scoring.low_threshold,
        }
    }

    pub fn score_calculator(&self) -> ScoreCalculator {
        ScoreCalculator::with_cap(self.scoring.score_cap)
    }

    pub fn priority_classifier(&self) -> PriorityClassifier {
        PriorityClassifier::new(self.thresholds())
    }

    pub fn validation_limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_product_spec_chars: self.validation.max_product_spec_chars,
            max_length: self.validation.max_length,
        }
    }

    /// Catalog built from the inline product list only.
    pub fn inline_catalog(&self) -> Catalog {
        Catalog::new(&self.catalog.products)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(scoring) = patch.scoring {
            if let Some(value) = scoring.critical_threshold {
                self.scoring.critical_threshold = value;
            }
            if let Some(value) = scoring.high_threshold {
                self.scoring.high_threshold = value;
            }
            if let Some(value) = scoring.medium_threshold {
                self.scoring.medium_threshold = value;
            }
            if let Some(value) = scoring.low_threshold {
                self.scoring.low_threshold = value;
            }
            if let Some(value) = scoring.score_cap {
                self.scoring.score_cap = value;
            }
        }

        if let Some(validation) = patch.validation {
            if let Some(value) = validation.max_product_spec_chars {
                self.validation.max_product_spec_chars = value;
            }
            if let Some(value) = validation.max_length {
                self.validation.max_length = value;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
            if let Some(products) = catalog.products {
                self.catalog.products = products;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level =
            read_env("SALESDESK_LOGGING_LEVEL").or_else(|| read_env("SALESDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SALESDESK_LOGGING_FORMAT").or_else(|| read_env("SALESDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("SALESDESK_SCORING_CRITICAL_THRESHOLD") {
            self.scoring.critical_threshold =
                parse_u8("SALESDESK_SCORING_CRITICAL_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_SCORING_HIGH_THRESHOLD") {
            self.scoring.high_threshold = parse_u8("SALESDESK_SCORING_HIGH_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_SCORING_MEDIUM_THRESHOLD") {
            self.scoring.medium_threshold =
                parse_u8("SALESDESK_SCORING_MEDIUM_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_SCORING_LOW_THRESHOLD") {
            self.scoring.low_threshold = parse_u8("SALESDESK_SCORING_LOW_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_SCORING_SCORE_CAP") {
            self.scoring.score_cap = parse_u8("SALESDESK_SCORING_SCORE_CAP", &value)?;
        }

        if let Some(value) = read_env("SALESDESK_VALIDATION_MAX_PRODUCT_SPEC_CHARS") {
            self.validation.max_product_spec_chars =
                parse_usize("SALESDESK_VALIDATION_MAX_PRODUCT_SPEC_CHARS", &value)?;
        }
        if let Some(value) = read_env("SALESDESK_VALIDATION_MAX_LENGTH") {
            self.validation.max_length = parse_u32("SALESDESK_VALIDATION_MAX_LENGTH", &value)?;
        }

        if let Some(value) = read_env("SALESDESK_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(score_cap) = overrides.score_cap {
            self.scoring.score_cap = score_cap;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)?;
        validate_scoring(&self.scoring)?;
        validate_validation(&self.validation)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("salesdesk.toml"), PathBuf::from("config/salesdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    let descending = scoring.critical_threshold > scoring.high_threshold
        && scoring.high_threshold > scoring.medium_threshold
        && scoring.medium_threshold > scoring.low_threshold;
    if !descending {
        return Err(ConfigError::Validation(
            "scoring thresholds must be strictly descending (critical > high > medium > low)"
                .to_string(),
        ));
    }

    if scoring.low_threshold == 0 {
        return Err(ConfigError::Validation(
            "scoring.low_threshold must be at least 1 so zero scores stay IGNORE".to_string(),
        ));
    }

    if scoring.score_cap < scoring.critical_threshold {
        return Err(ConfigError::Validation(format!(
            "scoring.score_cap ({}) must be at least scoring.critical_threshold ({})",
            scoring.score_cap, scoring.critical_threshold
        )));
    }

    Ok(())
}

fn validate_validation(validation: &ValidationConfig) -> Result<(), ConfigError> {
    if validation.max_product_spec_chars == 0 {
        return Err(ConfigError::Validation(
            "validation.max_product_spec_chars must be greater than zero".to_string(),
        ));
    }

    if validation.max_length == 0 {
        return Err(ConfigError::Validation(
            "validation.max_length must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u8(key: &str, value: &str) -> Result<u8, ConfigError> {
    value.trim().parse::<u8>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    scoring: Option<ScoringPatch>,
    validation: Option<ValidationPatch>,
    catalog: Option<CatalogPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    critical_threshold: Option<u8>,
    high_threshold: Option<u8>,
    medium_threshold: Option<u8>,
    low_threshold: Option<u8>,
    score_cap: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationPatch {
    max_product_spec_chars: Option<usize>,
    max_length: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    products: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::leads::DEFAULT_THRESHOLDS;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_the_scoring_tables() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.thresholds() == DEFAULT_THRESHOLDS, "default thresholds are 10/8/5/1")?;
        ensure(config.scoring.score_cap == 20, "default cap is 20")?;
        ensure(config.validation.max_product_spec_chars == 500, "spec limit is 500 chars")?;
        ensure(config.validation.max_length == 999_999, "max length is 999999")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SALESDESK_CATALOG_DIR", "/srv/catalog");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesdesk.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "${TEST_SALESDESK_CATALOG_DIR}/products.json"
products = ["XLPE Cable 4C", "PVC Cable 2C"]
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == Some(PathBuf::from("/srv/catalog/products.json")),
                "catalog path should be interpolated from environment",
            )?;
            ensure(
                config.inline_catalog().contains("xlpe cable 4c"),
                "inline catalog should contain configured products",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_SALESDESK_CATALOG_DIR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_LOG_LEVEL", "warn");
        env::set_var("SALESDESK_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SALESDESK_LOG_LEVEL", "SALESDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_SCORING_HIGH_THRESHOLD", "7");
        env::set_var("SALESDESK_CATALOG_PATH", "from-env.json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("salesdesk.toml");
            fs::write(
                &path,
                r#"
[scoring]
critical_threshold = 12
high_threshold = 9
score_cap = 18

[catalog]
path = "from-file.json"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_path: Some(PathBuf::from("from-override.json")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == Some(PathBuf::from("from-override.json")),
                "override catalog path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.scoring.critical_threshold == 12, "file threshold should win")?;
            ensure(config.scoring.high_threshold == 7, "env threshold should win over file")?;
            ensure(config.score_calculator().cap() == 18, "file cap should reach calculator")?;
            Ok(())
        })();

        clear_vars(&["SALESDESK_SCORING_HIGH_THRESHOLD", "SALESDESK_CATALOG_PATH"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_SCORING_MEDIUM_THRESHOLD", "9");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("strictly descending")
            );
            ensure(has_message, "validation failure should mention threshold ordering")
        })();

        clear_vars(&["SALESDESK_SCORING_MEDIUM_THRESHOLD"]);
        result
    }

    #[test]
    fn malformed_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SALESDESK_SCORING_SCORE_CAP", "twenty");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. }
                    if key == "SALESDESK_SCORING_SCORE_CAP"),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["SALESDESK_SCORING_SCORE_CAP"]);
        result
    }

    #[test]
    fn cap_below_critical_threshold_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { score_cap: Some(9), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        });

        ensure(
            matches!(
                result,
                Err(ConfigError::Validation(ref message)) if message.contains("score_cap")
            ),
            "cap below critical threshold should fail validation",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
