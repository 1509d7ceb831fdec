// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability registry for the Keel integration kernel.
//!
//! All cross-plugin functionality is invoked through this routing table.
//! Capabilities are keyed by hierarchical names (`category.action`); each
//! name may have several providers ordered by priority. Execution is
//! permission-checked and never fails with `Err`: outcomes are returned as
//! structured [`CapabilityResult`] values.

pub mod registry;
pub mod result;
pub mod widget;

pub use registry::{
    CapabilityFilter, CapabilityListing, CapabilityProvider, CapabilityRegistry,
    PreparedExecution, RegistryStats,
};
pub use result::{
    CapabilityErrorCode, CapabilityFailure, CapabilityOutput, CapabilityResult, DebugContext,
    DebugInfo,
};
pub use widget::RegisteredWidget;
