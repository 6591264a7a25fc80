//! Permission catalog and the permission evaluator.
//!
//! Every capability the hymn library gates is one of the [`Permission`]
//! variants below. The evaluator functions take an optional [`User`] and
//! answer a single yes/no question; they never fail and missing data always
//! resolves to a denial.
//!
//! # Example
//!
//! ```
//! use lectern::permission::{self, Permission};
//! use lectern::user::User;
//!
//! let editor = User::with_role("u-1", "editor");
//! assert!(permission::has_permission(Some(&editor), Permission::ContentPublish));
//! assert!(!permission::has_permission(Some(&editor), Permission::UsersDelete));
//! assert!(!permission::has_permission(None, Permission::ContentRead));
//! ```

use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::user::User;

/// Permission domain, the prefix before the dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Content,
    Users,
    System,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Content => "content",
            Domain::Users => "users",
            Domain::System => "system",
        }
    }
}

/// A capability identifier from the closed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Permission {
    ContentCreate,
    ContentRead,
    ContentUpdate,
    ContentDelete,
    ContentPublish,
    UsersCreate,
    UsersRead,
    UsersUpdate,
    UsersDelete,
    SystemSettings,
    SystemStats,
}

impl Permission {
    /// The whole catalog, in declaration order.
    pub const ALL: [Permission; 11] = [
        Permission::ContentCreate,
        Permission::ContentRead,
        Permission::ContentUpdate,
        Permission::ContentDelete,
        Permission::ContentPublish,
        Permission::UsersCreate,
        Permission::UsersRead,
        Permission::UsersUpdate,
        Permission::UsersDelete,
        Permission::SystemSettings,
        Permission::SystemStats,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ContentCreate => "content.create",
            Permission::ContentRead => "content.read",
            Permission::ContentUpdate => "content.update",
            Permission::ContentDelete => "content.delete",
            Permission::ContentPublish => "content.publish",
            Permission::UsersCreate => "users.create",
            Permission::UsersRead => "users.read",
            Permission::UsersUpdate => "users.update",
            Permission::UsersDelete => "users.delete",
            Permission::SystemSettings => "system.settings",
            Permission::SystemStats => "system.stats",
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            Permission::ContentCreate
            | Permission::ContentRead
            | Permission::ContentUpdate
            | Permission::ContentDelete
            | Permission::ContentPublish => Domain::Content,
            Permission::UsersCreate
            | Permission::UsersRead
            | Permission::UsersUpdate
            | Permission::UsersDelete => Domain::Users,
            Permission::SystemSettings | Permission::SystemStats => Domain::System,
        }
    }

    /// All catalog permissions belonging to `domain`.
    pub fn in_domain(domain: Domain) -> impl Iterator<Item = Permission> {
        Self::ALL.into_iter().filter(move |p| p.domain() == domain)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl std::str::FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == value)
            .ok_or_else(|| UnknownPermission(value.to_string()))
    }
}

impl TryFrom<String> for Permission {
    type Error = UnknownPermission;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for &'static str {
    fn from(p: Permission) -> Self {
        p.as_str()
    }
}

/// The permission list actually used for a decision.
///
/// An explicit, non-empty profile list wins outright over the role default.
/// Otherwise the parsed role's default set is used, and an absent or
/// unrecognized role falls back to the lowest-privilege defaults.
fn resolved_set(user: &User) -> Vec<Permission> {
    if let Some(explicit) = user.explicit_permissions() {
        return explicit
            .iter()
            .filter_map(|name| name.parse::<Permission>().ok())
            .collect();
    }

    let role = match user.role() {
        Some(role) => role,
        None => {
            if let Some(name) = user.role_name() {
                tracing::debug!(user = %user.id, role = name, "unrecognized role, using lowest-privilege defaults");
            }
            Role::LOWEST
        }
    };
    role.default_permissions().to_vec()
}

/// Decide whether `user` holds `permission`.
pub fn has_permission(user: Option<&User>, permission: Permission) -> bool {
    let Some(user) = user else {
        return false;
    };

    // Admin bypasses the mapped set entirely.
    if user.role() == Some(Role::Admin) {
        return true;
    }

    resolved_set(user).contains(&permission)
}

/// True when at least one of `permissions` is held. Empty input is false.
pub fn has_any_permission(user: Option<&User>, permissions: &[Permission]) -> bool {
    permissions.iter().any(|&p| has_permission(user, p))
}

/// True when every one of `permissions` is held. Empty input is true.
pub fn has_all_permissions(user: Option<&User>, permissions: &[Permission]) -> bool {
    permissions.iter().all(|&p| has_permission(user, p))
}

/// List the permissions `user` effectively holds.
///
/// Admins report the full catalog so that listings agree with the bypass in
/// [`has_permission`]. An absent user holds nothing.
pub fn effective_permissions(user: Option<&User>) -> Vec<Permission> {
    match user {
        None => Vec::new(),
        Some(user) if user.role() == Some(Role::Admin) => Permission::ALL.to_vec(),
        Some(user) => resolved_set(user),
    }
}
