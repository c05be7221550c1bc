//! Controller configuration.
//!
//! The controller reads a single TOML file:
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [scanner]
//! device = "pcsc"
//! channel_capacity = 100
//! idle_interval_ms = 0
//!
//! [strike]
//! actuator = "gpio"
//! gpio_pin = 18
//! grant_duration_ms = 3000
//! extend_policy = "reset"
//!
//! [datastore]
//! kind = "text_file"
//! path = "/etc/keyless/ids.txt"
//! ```
//!
//! Every key has a default except `datastore.path`.

use keyless_core::constants::{
    DEFAULT_GRANT_DURATION_MS, DEFAULT_IDLE_INTERVAL_MS, DEFAULT_SCAN_CHANNEL_CAPACITY,
    DEFAULT_STRIKE_CHANNEL_CAPACITY,
};
use keyless_hardware::{ExtendPolicy, ScannerConfig, StrikeConfig};
use keyless_store::DatastoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/keyless/config.toml";

/// Default GPIO line wired to the strike relay.
pub const DEFAULT_GPIO_PIN: u32 = 18;

/// Log levels accepted in `application.log_level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A single rejected setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: {message}")]
pub struct ValidationError {
    /// Dotted key of the setting, e.g. `strike.grant_duration_ms`.
    pub key: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            key,
            message: message.into(),
        }
    }
}

/// Whole controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub application: ApplicationSection,

    #[serde(default)]
    pub scanner: ScannerSection,

    #[serde(default)]
    pub strike: StrikeSection,

    pub datastore: DatastoreConfig,
}

/// `[application]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSection {
    pub log_level: String,
}

impl Default for ApplicationSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Scanning device family.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDeviceKind {
    /// PC/SC list-poll reader
    #[default]
    Pcsc,

    /// HID feature-report reader
    Hid,

    /// Mock device that never sees a badge
    Mock,
}

/// `[scanner]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    pub device: ScanDeviceKind,
    pub channel_capacity: usize,
    pub idle_interval_ms: u64,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            device: ScanDeviceKind::default(),
            channel_capacity: DEFAULT_SCAN_CHANNEL_CAPACITY,
            idle_interval_ms: DEFAULT_IDLE_INTERVAL_MS,
        }
    }
}

impl ScannerSection {
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            channel_capacity: self.channel_capacity,
            idle_interval: Duration::from_millis(self.idle_interval_ms),
        }
    }
}

/// Strike actuator family.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    /// Sysfs GPIO output
    #[default]
    Gpio,

    /// Mock actuator that only records writes
    Mock,
}

/// `[strike]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrikeSection {
    pub actuator: ActuatorKind,
    pub gpio_pin: u32,
    pub grant_duration_ms: u64,
    pub extend_policy: ExtendPolicy,
}

impl Default for StrikeSection {
    fn default() -> Self {
        Self {
            actuator: ActuatorKind::default(),
            gpio_pin: DEFAULT_GPIO_PIN,
            grant_duration_ms: DEFAULT_GRANT_DURATION_MS,
            extend_policy: ExtendPolicy::default(),
        }
    }
}

impl StrikeSection {
    pub fn strike_config(&self) -> StrikeConfig {
        StrikeConfig {
            extend_policy: self.extend_policy,
            channel_capacity: DEFAULT_STRIKE_CHANNEL_CAPACITY,
        }
    }

    /// How long a granted badge holds the door open.
    pub fn grant_duration(&self) -> Duration {
        Duration::from_millis(self.grant_duration_ms)
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ControllerConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<ControllerConfig> {
    let config: ControllerConfig = toml::from_str(content)?;

    let errors = validate_config(&config);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(config)
}

/// Collect every invalid setting.
pub fn validate_config(config: &ControllerConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !is_log_level(&config.application.log_level) {
        errors.push(ValidationError::new(
            "application.log_level",
            format!(
                "unknown level '{}', expected one of {}",
                config.application.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.scanner.channel_capacity == 0 {
        errors.push(ValidationError::new(
            "scanner.channel_capacity",
            "must be at least 1",
        ));
    }

    if config.strike.grant_duration_ms == 0 {
        errors.push(ValidationError::new(
            "strike.grant_duration_ms",
            "must be greater than zero",
        ));
    }

    if config.datastore.path.as_os_str().is_empty() {
        errors.push(ValidationError::new("datastore.path", "cannot be empty"));
    }

    errors
}

/// Whether `level` is an accepted log level (case-insensitive).
pub fn is_log_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyless_store::DatastoreKind;
    use rstest::rstest;
    use std::path::PathBuf;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(
            r#"
            [datastore]
            path = "/etc/keyless/ids.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.scanner.device, ScanDeviceKind::Pcsc);
        assert_eq!(config.scanner.channel_capacity, 100);
        assert_eq!(config.scanner.idle_interval_ms, 0);
        assert_eq!(config.strike.actuator, ActuatorKind::Gpio);
        assert_eq!(config.strike.gpio_pin, 18);
        assert_eq!(config.strike.grant_duration(), Duration::from_secs(3));
        assert_eq!(config.strike.extend_policy, ExtendPolicy::Reset);
        assert_eq!(config.datastore.kind, DatastoreKind::TextFile);
        assert_eq!(config.datastore.path, PathBuf::from("/etc/keyless/ids.txt"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [application]
            log_level = "debug"

            [scanner]
            device = "hid"
            channel_capacity = 8
            idle_interval_ms = 50

            [strike]
            actuator = "mock"
            gpio_pin = 4
            grant_duration_ms = 5000
            extend_policy = "additive"

            [datastore]
            kind = "sqlite"
            path = "/var/lib/keyless/badges.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.scanner.device, ScanDeviceKind::Hid);
        let scanner = config.scanner.scanner_config();
        assert_eq!(scanner.channel_capacity, 8);
        assert_eq!(scanner.idle_interval, Duration::from_millis(50));

        assert_eq!(config.strike.actuator, ActuatorKind::Mock);
        assert_eq!(config.strike.gpio_pin, 4);
        assert_eq!(config.strike.grant_duration(), Duration::from_secs(5));
        assert_eq!(
            config.strike.strike_config().extend_policy,
            ExtendPolicy::Additive
        );
        assert_eq!(config.datastore.kind, DatastoreKind::Sqlite);
    }

    #[test]
    fn test_missing_datastore_is_rejected() {
        let result = parse_config("[application]\nlog_level = \"info\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        let result = parse_config(
            r#"
            [scanner]
            device = "libnfc"

            [datastore]
            path = "ids.txt"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[rstest]
    #[case("[application]\nlog_level = \"loud\"\n", "application.log_level")]
    #[case("[scanner]\nchannel_capacity = 0\n", "scanner.channel_capacity")]
    #[case("[strike]\ngrant_duration_ms = 0\n", "strike.grant_duration_ms")]
    fn test_invalid_settings_are_rejected(#[case] section: &str, #[case] key: &str) {
        let content = format!("{section}\n[datastore]\npath = \"ids.txt\"\n");

        match parse_config(&content) {
            Err(ConfigError::ValidationFailed { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].key, key);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_datastore_path_is_rejected() {
        let result = parse_config("[datastore]\npath = \"\"\n");

        let Err(ConfigError::ValidationFailed { errors }) = result else {
            panic!("expected validation failure");
        };
        assert_eq!(errors[0].key, "datastore.path");
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let result = parse_config(
            r#"
            [scanner]
            channel_capacity = 0

            [strike]
            grant_duration_ms = 0

            [datastore]
            path = ""
            "#,
        );

        let Err(error) = result else {
            panic!("expected validation failure");
        };
        let message = error.to_string();
        assert!(message.contains("scanner.channel_capacity"));
        assert!(message.contains("strike.grant_duration_ms"));
        assert!(message.contains("datastore.path"));
    }

    #[rstest]
    #[case("info", true)]
    #[case("WARN", true)]
    #[case("trace", true)]
    #[case("verbose", false)]
    #[case("", false)]
    fn test_log_level_names(#[case] level: &str, #[case] valid: bool) {
        assert_eq!(is_log_level(level), valid);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[datastore]\npath = \"ids.txt\"\n").unwrap();

        assert!(load_config(&path).is_ok());
        assert!(matches!(
            load_config(dir.path().join("missing.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }
}
