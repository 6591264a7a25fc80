//! Declarative permission gates.
//!
//! A [`Gate`] wraps a [`Requirement`] and picks between a primary value and a
//! fallback depending on the current user. The decision is recomputed on
//! every call; nothing is cached.
//!
//! ```
//! use lectern::gate::{Gate, Requirement};
//! use lectern::permission::Permission;
//! use lectern::user::User;
//!
//! let gate = Gate::new(Requirement::Single(Permission::UsersDelete));
//! let viewer = User::with_role("u-1", "viewer");
//!
//! assert_eq!(gate.render(Some(&viewer), "delete button", Some("")), Some(""));
//! assert_eq!(gate.render(Some(&viewer), "delete button", None), None);
//! ```

use serde::Serialize;

use crate::permission::{self, Permission};
use crate::user::User;

/// What a gate or guard demands of the user. Exactly one mode at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "permissions", rename_all = "snake_case")]
pub enum Requirement {
    Single(Permission),
    AnyOf(Vec<Permission>),
    AllOf(Vec<Permission>),
}

impl Requirement {
    pub fn any_of(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Requirement::AnyOf(permissions.into_iter().collect())
    }

    pub fn all_of(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Requirement::AllOf(permissions.into_iter().collect())
    }

    /// Build a requirement from the three independent optional inputs older
    /// call sites pass.
    ///
    /// Precedence is all-of, then any-of, then single: when several are
    /// given the later mode in that list is ignored. Returns `None` when no
    /// input is supplied.
    pub fn from_props(
        permission: Option<Permission>,
        any_of: Option<Vec<Permission>>,
        all_of: Option<Vec<Permission>>,
    ) -> Option<Self> {
        all_of
            .map(Requirement::AllOf)
            .or_else(|| any_of.map(Requirement::AnyOf))
            .or_else(|| permission.map(Requirement::Single))
    }

    pub fn is_met_by(&self, user: Option<&User>) -> bool {
        match self {
            Requirement::Single(p) => permission::has_permission(user, *p),
            Requirement::AnyOf(ps) => permission::has_any_permission(user, ps),
            Requirement::AllOf(ps) => permission::has_all_permissions(user, ps),
        }
    }
}

impl From<Permission> for Requirement {
    fn from(p: Permission) -> Self {
        Requirement::Single(p)
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn list(ps: &[Permission]) -> String {
            ps.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
        }
        match self {
            Requirement::Single(p) => write!(f, "{p}"),
            Requirement::AnyOf(ps) => write!(f, "any of [{}]", list(ps)),
            Requirement::AllOf(ps) => write!(f, "all of [{}]", list(ps)),
        }
    }
}

/// Conditional render wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    requirement: Option<Requirement>,
}

impl Gate {
    pub fn new(requirement: impl Into<Requirement>) -> Self {
        Self {
            requirement: Some(requirement.into()),
        }
    }

    /// Gate built from legacy props; see [`Requirement::from_props`].
    ///
    /// A gate built with no input denies everyone.
    pub fn from_props(
        permission: Option<Permission>,
        any_of: Option<Vec<Permission>>,
        all_of: Option<Vec<Permission>>,
    ) -> Self {
        Self {
            requirement: Requirement::from_props(permission, any_of, all_of),
        }
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        self.requirement.as_ref()
    }

    pub fn allows(&self, user: Option<&User>) -> bool {
        self.requirement
            .as_ref()
            .is_some_and(|req| req.is_met_by(user))
    }

    /// Return `children` when the user passes, otherwise `fallback`.
    pub fn render<T>(&self, user: Option<&User>, children: T, fallback: Option<T>) -> Option<T> {
        if self.allows(user) {
            Some(children)
        } else {
            fallback
        }
    }

    /// Like [`render`](Self::render) but only builds the branch that is shown.
    pub fn render_with<T>(
        &self,
        user: Option<&User>,
        children: impl FnOnce() -> T,
        fallback: impl FnOnce() -> Option<T>,
    ) -> Option<T> {
        if self.allows(user) {
            Some(children())
        } else {
            fallback()
        }
    }
}
