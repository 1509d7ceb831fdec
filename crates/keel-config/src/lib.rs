// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Keel integration kernel.
//!
//! TOML files layered by Figment with `KEEL_*` environment overrides, strict
//! key checking, semantic validation, and miette diagnostics.
//!
//! # Usage
//!
//! ```no_run
//! use keel_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("health interval: {:?}", config.health_interval());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AggregationConfig, HealthConfig, IntegrationSection, KeelConfig, LinkingConfig, PluginsConfig,
};
pub use validation::validate_config;

/// Load from the standard locations and validate.
pub fn load_and_validate() -> Result<KeelConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => validate_config(&config).map(|()| config),
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &read_sources())),
    }
}

/// Load from a TOML string and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeelConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => validate_config(&config).map(|()| config),
        Err(err) => {
            let sources = [("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Contents of every existing config file, for diagnostic spans.
fn read_sources() -> Vec<(String, String)> {
    loader::config_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let name = std::fs::canonicalize(&path).unwrap_or(path).display().to_string();
            Some((name, content))
        })
        .collect()
}
