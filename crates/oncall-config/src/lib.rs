//! Configuration parsing and validation for oncall-sim
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Simulation service URL, timeout and credentials
//! - Workday scheduling: initial delay, incident target, wait-time buckets
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

impl From<ConfigError> for oncall_util::OncallError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationFailed { errors } => oncall_util::OncallError::validation(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => oncall_util::OncallError::config(other.to_string()),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let settings = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(settings)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();

        assert_eq!(settings.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.workday.company_id, None);
        assert_eq!(settings.workday.intervals.len(), 4);
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [api]
            base_url = "https://sim.example.com"
            request_timeout_seconds = 10

            [auth]
            email = "oncall@example.com"
            password = "hunter2"

            [workday]
            company_id = 7
            initial_delay_seconds = 2
            default_incidents_scheduled = 3
            seed = 42

            [[workday.intervals]]
            weight = 0.75
            min_seconds = 10
            max_seconds = 60
            label = "burst"

            [[workday.intervals]]
            weight = 0.25
            min_seconds = 60
            max_seconds = 600
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.api.base_url, "https://sim.example.com");
        assert_eq!(
            settings.auth.credentials.as_ref().map(|c| c.email.as_str()),
            Some("oncall@example.com")
        );
        assert_eq!(settings.workday.company_id, Some(oncall_util::CompanyId::new(7)));
        assert_eq!(settings.workday.initial_delay_seconds, 2);
        assert_eq!(settings.workday.default_incidents_scheduled, 3);
        assert_eq!(settings.workday.seed, Some(42));
        assert_eq!(settings.workday.intervals.len(), 2);
        assert_eq!(settings.workday.intervals[0].label, "burst");
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_bad_bucket_table() {
        let config = r#"
            config_version = 1

            [[workday.intervals]]
            weight = 0.5
            min_seconds = 10
            max_seconds = 60
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => {
                assert!(matches!(errors[..], [ValidationError::IntervalWeights { .. }]));
            }
            other => panic!("Expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1").unwrap();
        writeln!(file, "[workday]").unwrap();
        writeln!(file, "company_id = 3").unwrap();

        let settings = load_config(file.path()).unwrap();
        assert_eq!(settings.workday.company_id, Some(oncall_util::CompanyId::new(3)));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
