//! Configuration loading.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment keys, then command-line overrides.

use crate::config::{validate_config, Config, LogFormat};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("configuration validation failed: {0}")]
    ValidationError(String),

    #[error("failed to load env file: {0}")]
    EnvFile(#[source] dotenvy::Error),
}

/// Values given on the command line, applied last.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Load and validate the configuration.
///
/// # Arguments
///
/// * `path` - Optional YAML file
/// * `env` - Snapshot of the process environment
/// * `overrides` - Command-line values
pub fn load_config(
    path: Option<&Path>,
    env: &HashMap<String, String>,
    overrides: &Overrides,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)?
        }
        None => Config::default(),
    };

    apply_env(&mut config, env)?;

    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(level) = &overrides.log_level {
        config.global.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::ValidationError)?;

    Ok(config)
}

/// Load `KEY=value` pairs from `path` into the process environment.
///
/// Keys already set are left alone. Returns `false` when the file does not
/// exist; an unreadable or malformed file is an error.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::EnvFile(e)),
    }
}

/// Apply environment keys on top of `config`.
fn apply_env(config: &mut Config, env: &HashMap<String, String>) -> Result<(), ConfigError> {
    if let Some(value) = env.get("PORT") {
        config.server.port = parse_value("PORT", value, |v| v.parse::<u16>().map_err(|e| e.to_string()))?;
    }
    if let Some(value) = env.get("HOST") {
        config.server.host = parse_value("HOST", value, |v| v.parse::<IpAddr>().map_err(|e| e.to_string()))?;
    }
    if let Some(value) = env.get("POLL_INTERVAL") {
        config.monitor.interval = parse_value("POLL_INTERVAL", value, parse_duration)?;
    }
    if let Some(value) = env.get("PROBE_TIMEOUT") {
        config.monitor.timeout = parse_value("PROBE_TIMEOUT", value, parse_duration)?;
    }
    if let Some(value) = env.get("ENDPOINT_PREFIX") {
        config.monitor.endpoint_prefix = value.clone();
    }
    if let Some(value) = env.get("LOG_LEVEL") {
        config.global.log_level = value.clone();
    }
    if let Some(value) = env.get("LOG_FORMAT") {
        config.global.log_format = parse_value("LOG_FORMAT", value, |v| v.parse::<LogFormat>())?;
    }
    Ok(())
}

fn parse_value<T>(
    key: &str,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    parse(value.trim()).map_err(|reason| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| e.to_string())
}
