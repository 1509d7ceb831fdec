// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin trait definitions.
//!
//! Every plugin implements [`IntegrationPlugin`] and one or both of the
//! capability-set traits. All traits use `#[async_trait]` for dynamic
//! dispatch compatibility.

pub mod execution;
pub mod handle;
pub mod information;
pub mod plugin;

pub use execution::ExecutionTool;
pub use handle::PluginHandle;
pub use information::InformationSource;
pub use plugin::IntegrationPlugin;
