// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::KeelConfig;

/// Validate a deserialized configuration, collecting every error.
pub fn validate_config(config: &KeelConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.health.scheduler_enabled && config.health.interval_secs == 0 {
        errors.push(ConfigError::validation(
            "health.interval_secs must be at least 1 when the scheduler is enabled",
        ));
    }

    if config.aggregation.source_timeout_secs == Some(0) {
        errors.push(ConfigError::validation(
            "aggregation.source_timeout_secs must be at least 1; omit it to disable the bound",
        ));
    }

    if config.linking.authoritative_source.trim().is_empty() {
        errors.push(ConfigError::validation("linking.authoritative_source must not be empty"));
    }

    for name in config.integrations.keys() {
        if name.trim().is_empty() {
            errors.push(ConfigError::validation("integration names must not be empty"));
        } else if name.chars().any(char::is_whitespace) {
            errors.push(ConfigError::validation(format!(
                "integration name `{name}` must not contain whitespace"
            )));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
