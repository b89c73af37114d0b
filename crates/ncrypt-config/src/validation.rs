// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! All checks run; errors are collected rather than failing fast.

use crate::diagnostic::ConfigError;
use crate::model::NcryptConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &NcryptConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "api.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("api.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.api.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "api.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.secrets.decode_concurrency < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "secrets.decode_concurrency must be at least 1, got {}",
                config.secrets.decode_concurrency
            ),
        });
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &NcryptConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&NcryptConfig::default()).is_ok());
    }

    #[test]
    fn non_http_base_url_fails() {
        let mut config = NcryptConfig::default();
        config.api.base_url = "ftp://vault.example".to_string();
        assert!(messages(&config)[0].contains("api.base_url"));
    }

    #[test]
    fn zero_timeout_fails() {
        let mut config = NcryptConfig::default();
        config.api.timeout_secs = 0;
        assert!(messages(&config)[0].contains("timeout_secs"));
    }

    #[test]
    fn zero_concurrency_fails() {
        let mut config = NcryptConfig::default();
        config.secrets.decode_concurrency = 0;
        assert!(messages(&config)[0].contains("decode_concurrency"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = NcryptConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());

        config.log.level = "verbose".to_string();
        assert!(messages(&config)[0].contains("log.level"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = NcryptConfig::default();
        config.api.base_url = String::new();
        config.api.timeout_secs = 0;
        config.secrets.decode_concurrency = 0;
        config.log.level = "loud".to_string();
        assert_eq!(messages(&config).len(), 4);
    }
}
