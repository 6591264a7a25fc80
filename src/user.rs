//! User records as delivered by the identity/profile service.
//!
//! These are read-only views. Nothing in this crate creates or mutates a
//! profile; the evaluator only reads it.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Authenticated identity with an optional profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

/// Role and explicit permission override for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Explicit permission list; when non-empty it replaces the role default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl User {
    /// A user with no profile.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: None,
        }
    }

    /// A user whose profile carries only a role name.
    pub fn with_role(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: Some(Profile {
                role: Some(role.into()),
                permissions: None,
            }),
        }
    }

    /// Attach an explicit permission override list.
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = permissions.into_iter().map(Into::into).collect();
        self.profile.get_or_insert_with(Profile::default).permissions = Some(list);
        self
    }

    /// Raw role name from the profile, if any.
    pub fn role_name(&self) -> Option<&str> {
        self.profile.as_ref()?.role.as_deref()
    }

    /// Canonical role, or `None` when missing or unrecognized.
    pub fn role(&self) -> Option<Role> {
        self.role_name().and_then(Role::parse)
    }

    /// Explicit permission list, only when present and non-empty.
    pub fn explicit_permissions(&self) -> Option<&[String]> {
        self.profile
            .as_ref()?
            .permissions
            .as_deref()
            .filter(|list| !list.is_empty())
    }
}
