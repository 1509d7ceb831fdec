// SPDX-FileCopyrightText: 2026 Keel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User fixtures for authorization tests.

use keel_core::{User, ADMIN_ROLE};

/// A user holding the platform admin role.
pub fn admin_user() -> User {
    User::new("admin-1", "admin").with_roles([ADMIN_ROLE])
}

/// A user with no roles or permissions.
pub fn anonymous_user() -> User {
    User::new("anon-1", "anonymous")
}

pub fn user_with_permissions(permissions: &[&str]) -> User {
    User::new("user-perm", "operator").with_permissions(permissions.iter().copied())
}

pub fn user_with_roles(roles: &[&str]) -> User {
    User::new("user-role", "viewer").with_roles(roles.iter().copied())
}
