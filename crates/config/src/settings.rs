//! Main settings module

use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Slot generation parameters
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Conversation lifecycle parameters
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Path to the provider directory file (JSON); embedded defaults are
    /// used when the file is absent
    #[serde(default = "default_directory_path")]
    pub directory_path: String,
}

fn default_directory_path() -> String {
    "data/providers.json".to_string()
}

/// Slot generation parameters for the domain directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Slot granularity in minutes
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// Scan horizon in calendar days, starting tomorrow
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Lunch-break exclusion window start, HH:MM
    #[serde(default = "default_lunch_start")]
    pub lunch_start: String,

    /// Lunch-break exclusion window end, HH:MM
    #[serde(default = "default_lunch_end")]
    pub lunch_end: String,
}

fn default_slot_minutes() -> u32 {
    15
}

fn default_horizon_days() -> u32 {
    30
}

fn default_lunch_start() -> String {
    "13:00".to_string()
}

fn default_lunch_end() -> String {
    "14:00".to_string()
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: default_slot_minutes(),
            horizon_days: default_horizon_days(),
            lunch_start: default_lunch_start(),
            lunch_end: default_lunch_end(),
        }
    }
}

impl SchedulingConfig {
    /// Parse the lunch window into times, validating the ordering
    pub fn lunch_window(&self) -> Result<(NaiveTime, NaiveTime), ConfigError> {
        let start = parse_time("scheduling.lunch_start", &self.lunch_start)?;
        let end = parse_time("scheduling.lunch_end", &self.lunch_end)?;
        if start >= end {
            return Err(ConfigError::InvalidValue {
                field: "scheduling.lunch_start".to_string(),
                message: format!("lunch window {} >= {} is empty", start, end),
            });
        }
        Ok((start, end))
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("{value:?} is not a valid HH:MM time: {e}"),
    })
}

/// Conversation lifecycle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Records idle longer than this are swept
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// How often the stale sweep runs
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Availability cache entry time-to-live
    #[serde(default = "default_availability_ttl_secs")]
    pub availability_ttl_secs: u64,
}

fn default_stale_after_secs() -> u64 {
    900 // 15 minutes of silence means the call was abandoned
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_availability_ttl_secs() -> u64 {
    30
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            availability_ttl_secs: default_availability_ttl_secs(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (RUST_LOG syntax)
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_filter() -> String {
    "info,frontdesk=debug".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
        }
    }
}

impl Settings {
    /// Validate settings; strict environments turn warnings into errors
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduling.slot_minutes == 0 || self.scheduling.slot_minutes > 120 {
            return Err(ConfigError::InvalidValue {
                field: "scheduling.slot_minutes".to_string(),
                message: format!("{} is out of range 1..=120", self.scheduling.slot_minutes),
            });
        }
        if self.scheduling.horizon_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduling.horizon_days".to_string(),
                message: "horizon must cover at least one day".to_string(),
            });
        }
        self.scheduling.lunch_window()?;

        if self.conversation.stale_after_secs < self.conversation.sweep_interval_secs {
            if self.environment.is_strict() {
                return Err(ConfigError::InvalidValue {
                    field: "conversation.stale_after_secs".to_string(),
                    message: "staleness threshold shorter than the sweep interval".to_string(),
                });
            }
            tracing::warn!(
                stale_after_secs = self.conversation.stale_after_secs,
                sweep_interval_secs = self.conversation.sweep_interval_secs,
                "staleness threshold shorter than the sweep interval"
            );
        }
        Ok(())
    }
}

/// Load settings from an optional file plus FRONTDESK_ environment variables.
///
/// Environment variables override file values, e.g.
/// `FRONTDESK_SCHEDULING__SLOT_MINUTES=30`.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(File::from(path));
    }

    let config = builder
        .add_source(Environment::with_prefix("FRONTDESK").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.scheduling.slot_minutes, 15);
        assert_eq!(settings.scheduling.horizon_days, 30);
    }

    #[test]
    fn test_lunch_window_parsing() {
        let scheduling = SchedulingConfig::default();
        let (start, end) = scheduling.lunch_window().unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    }

    #[test]
    fn test_inverted_lunch_window_rejected() {
        let scheduling = SchedulingConfig {
            lunch_start: "14:00".to_string(),
            lunch_end: "13:00".to_string(),
            ..Default::default()
        };
        assert!(scheduling.lunch_window().is_err());
    }

    #[test]
    fn test_zero_slot_minutes_rejected() {
        let settings = Settings {
            scheduling: SchedulingConfig {
                slot_minutes: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "environment = \"staging\"\n[scheduling]\nslot_minutes = 30"
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.environment, RuntimeEnvironment::Staging);
        assert_eq!(settings.scheduling.slot_minutes, 30);
        // Untouched fields fall back to defaults
        assert_eq!(settings.scheduling.horizon_days, 30);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_settings(Some(Path::new("/nonexistent/frontdesk.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
