// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured outcomes of capability execution.
//!
//! Execution never returns `Err`; lookup, authorization, and handler failures
//! are carried as data in a [`CapabilityResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapabilityErrorCode {
    CapabilityNotFound,
    PermissionDenied,
    ExecutionError,
}

impl std::fmt::Display for CapabilityErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityErrorCode::CapabilityNotFound => write!(f, "CAPABILITY_NOT_FOUND"),
            CapabilityErrorCode::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            CapabilityErrorCode::ExecutionError => write!(f, "EXECUTION_ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFailure {
    pub code: CapabilityErrorCode,
    pub message: String,
}

/// Successful handler output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityOutput {
    pub data: Value,
    /// Plugin whose handler produced `data`.
    pub handled_by: String,
    pub duration_ms: u64,
}

/// Caller-supplied tracing context for a capability call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugContext {
    /// Propagated to the handler; generated when absent.
    pub correlation_id: Option<String>,
}

impl DebugContext {
    pub fn with_correlation_id(id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(id.into()),
        }
    }
}

/// Routing details attached when a [`DebugContext`] was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub correlation_id: String,
    pub capability_name: String,
    pub plugin_name: Option<String>,
    pub providers_count: usize,
}

/// Outcome of [`execute_capability`](crate::CapabilityRegistry::execute_capability).
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityResult {
    pub outcome: Result<CapabilityOutput, CapabilityFailure>,
    pub debug: Option<DebugInfo>,
}

impl CapabilityResult {
    pub(crate) fn failure(
        code: CapabilityErrorCode,
        message: impl Into<String>,
        debug: Option<DebugInfo>,
    ) -> Self {
        Self {
            outcome: Err(CapabilityFailure {
                code,
                message: message.into(),
            }),
            debug,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn data(&self) -> Option<&Value> {
        self.outcome.as_ref().ok().map(|o| &o.data)
    }

    pub fn handled_by(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(|o| o.handled_by.as_str())
    }

    pub fn error_code(&self) -> Option<CapabilityErrorCode> {
        self.outcome.as_ref().err().map(|e| e.code)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(|e| e.message.as_str())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handled_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a CapabilityFailure>,
    #[serde(flatten)]
    debug: Option<&'a DebugInfo>,
}

impl Serialize for CapabilityResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match &self.outcome {
            Ok(out) => ResultWire {
                success: true,
                data: Some(&out.data),
                handled_by: Some(&out.handled_by),
                duration_ms: Some(out.duration_ms),
                error: None,
                debug: self.debug.as_ref(),
            },
            Err(failure) => ResultWire {
                success: false,
                data: None,
                handled_by: None,
                duration_ms: None,
                error: Some(failure),
                debug: self.debug.as_ref(),
            },
        };
        wire.serialize(serializer)
    }
}
