//! Configuration validation.

use crate::config::Config;
use std::time::Duration;

/// Validate the configuration.
///
/// Checks for:
/// - A known log level
/// - Non-zero poll interval and probe timeout
/// - A non-empty endpoint prefix
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    if config.monitor.interval == Duration::ZERO {
        errors.push("poll interval must be greater than zero".to_string());
    }

    if config.monitor.timeout == Duration::ZERO {
        errors.push("probe timeout must be greater than zero".to_string());
    }

    if config.monitor.endpoint_prefix.trim().is_empty() {
        errors.push("endpoint prefix cannot be empty".to_string());
    }

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.monitor.timeout = Duration::ZERO;
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("probe timeout"));
    }

    #[test]
    fn test_empty_prefix() {
        let mut config = Config::default();
        config.monitor.endpoint_prefix = "  ".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("endpoint prefix"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.global.log_level = "loud".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("invalid log level 'loud'"));
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = Config::default();
        config.monitor.interval = Duration::ZERO;
        config.global.log_level = "loud".to_string();
        let message = validate_config(&config).unwrap_err();
        assert!(message.contains("poll interval"));
        assert!(message.contains("; "));
    }
}
