// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later overriding earlier:
//! 1. Compiled defaults
//! 2. `/etc/keel/keel.toml`
//! 3. `~/.config/keel/keel.toml`
//! 4. `./keel.toml`
//! 5. `KEEL_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeelConfig;

const SYSTEM_CONFIG: &str = "/etc/keel/keel.toml";
const LOCAL_CONFIG: &str = "keel.toml";

/// Config file locations in merge order. Missing files are skipped.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("keel").join("keel.toml"));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

/// The full layered figment, before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
}

/// Load from every standard location plus the environment.
pub fn load_config() -> Result<KeelConfig, figment::Error> {
    build_figment().extract()
}

/// Load from a TOML string over the defaults. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<KeelConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Load from one file with environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeelConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(KeelConfig::default()))
}

/// `KEEL_HEALTH_INTERVAL_SECS` maps to `health.interval_secs`.
///
/// Only the first underscore after a known section is a separator, since keys
/// themselves contain underscores.
fn env_provider() -> Env {
    const SECTIONS: [&str; 4] = ["plugins", "health", "aggregation", "linking"];
    Env::prefixed("KEEL_").map(|key| {
        let key = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key.to_string())
            .into()
    })
}
