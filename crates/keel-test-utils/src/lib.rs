// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keel integration tests.
//!
//! Provides mock plugins with scripted behavior so manager, registry, and
//! linking tests run deterministically without real backends.
//!
//! # Components
//!
//! - [`MockInformationSource`] - inventory and facts from fixed data, with injectable failures
//! - [`MockExecutionTool`] - records actions and reports success per target
//! - [`MockHybridPlugin`] - both capability sets on one instance
//! - [`users`] - admin, role, and permission fixtures

mod lifecycle;
pub mod mock_hybrid;
pub mod mock_source;
pub mod mock_tool;
pub mod users;

pub use lifecycle::LifecycleLog;
pub use mock_hybrid::MockHybridPlugin;
pub use mock_source::MockInformationSource;
pub use mock_tool::MockExecutionTool;
pub use users::{admin_user, anonymous_user, user_with_permissions, user_with_roles};

use keel_core::{handler_fn, Capability, RiskLevel};
use serde_json::json;

/// A capability whose handler answers `{"plugin": tag, "args": args}`.
///
/// Useful for asserting which provider the registry routed to.
pub fn tagged_capability(name: &str, tag: &str, required_permissions: &[&str]) -> Capability {
    let tag = tag.to_string();
    Capability::new(
        name,
        RiskLevel::Execute,
        handler_fn(move |args, _ctx| {
            let tag = tag.clone();
            async move { Ok(json!({ "plugin": tag, "args": args })) }
        }),
    )
    .with_permissions(required_permissions.iter().copied())
}
