// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keel integration kernel.

use thiserror::Error;

/// The primary error type used across plugin traits and kernel operations.
///
/// Only programmer-error-class conditions are surfaced as `Err(KeelError)` by
/// the registry and manager. Backend misbehaviour is reported as data.
#[derive(Debug, Error)]
pub enum KeelError {
    /// Configuration errors (mismatched name/type, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A plugin with the same name is already registered.
    #[error("plugin '{name}' is already registered")]
    DuplicatePlugin { name: String },

    /// A capability definition was rejected at registration time.
    #[error("invalid capability '{name}': {reason}")]
    InvalidCapability { name: String, reason: String },

    /// A widget definition was rejected at registration time.
    #[error("invalid widget '{id}': {reason}")]
    InvalidWidget { id: String, reason: String },

    /// Requested plugin was not found in the manager.
    #[error("plugin not found: {kind}/{name}")]
    PluginNotFound { kind: String, name: String },

    /// Requested plugin exists but has not completed initialization.
    #[error("plugin '{name}' is not initialized")]
    PluginNotInitialized { name: String },

    /// No information source reports the node.
    #[error("node '{node_id}' not found in any source")]
    NodeNotFound { node_id: String },

    /// A read method was called before `initialize_plugins` completed.
    #[error("integration manager is not initialized")]
    ManagerNotInitialized,

    /// A call into a plugin failed.
    #[error("plugin '{name}' failed: {message}")]
    Plugin { name: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeelError {
    /// Convenience constructor for plugin-call failures.
    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        KeelError::Plugin {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The message a caller should see, without the variant prefix for
    /// plugin-reported failures.
    pub fn detail(&self) -> String {
        match self {
            KeelError::Plugin { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
