//! Canonical roles and their default permission sets.
//!
//! Roles are ordered by privilege: `Viewer < Contributor < Editor < Admin`.
//! The order is defined here once; guards that want hierarchy-aware checks
//! use [`Role::includes`] instead of comparing role strings.

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Contributor,
    Editor,
    Admin,
}

const ADMIN_DEFAULTS: &[Permission] = &Permission::ALL;

const EDITOR_DEFAULTS: &[Permission] = &[
    Permission::ContentCreate,
    Permission::ContentRead,
    Permission::ContentUpdate,
    Permission::ContentPublish,
];

const CONTRIBUTOR_DEFAULTS: &[Permission] = &[
    Permission::ContentCreate,
    Permission::ContentRead,
    Permission::ContentUpdate,
];

const VIEWER_DEFAULTS: &[Permission] = &[Permission::ContentRead];

impl Role {
    /// Role used when a profile carries no usable role.
    pub const LOWEST: Role = Role::Viewer;

    pub const ALL: [Role; 4] = [Role::Viewer, Role::Contributor, Role::Editor, Role::Admin];

    /// Parse a role name as stored by the identity service.
    ///
    /// Names match exactly; `administrator` is accepted as an alias for
    /// `admin`. Anything else, including other casings or padded names, is
    /// unrecognized and gets `None`.
    pub fn parse(name: &str) -> Option<Role> {
        match name {
            "admin" | "administrator" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "contributor" => Some(Role::Contributor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Contributor => "contributor",
            Role::Viewer => "viewer",
        }
    }

    /// Default permission set granted by this role.
    ///
    /// Note the evaluator never consults the admin set: admins bypass checks.
    pub fn default_permissions(self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_DEFAULTS,
            Role::Editor => EDITOR_DEFAULTS,
            Role::Contributor => CONTRIBUTOR_DEFAULTS,
            Role::Viewer => VIEWER_DEFAULTS,
        }
    }

    /// Whether this role is at least as privileged as `other`.
    pub fn includes(self, other: Role) -> bool {
        self >= other
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
