//! Configuration management for the call-handling agent
//!
//! Supports loading configuration from:
//! - TOML/JSON files
//! - Environment variables (FRONTDESK_ prefix)
//! - Built-in defaults (every field has one)

pub mod settings;

pub use settings::{
    load_settings, ConversationConfig, ObservabilityConfig, RuntimeEnvironment, SchedulingConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
