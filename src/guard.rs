//! Route guards.
//!
//! A guard turns the current [`SessionState`] into one of four outcomes:
//!
//! | session                         | outcome                                |
//! |---------------------------------|----------------------------------------|
//! | loading                         | [`Outcome::Loading`]                   |
//! | unauthenticated                 | redirect to login, carrying the path   |
//! | authenticated, not authorized   | redirect to the unauthorized page      |
//! | authenticated, authorized       | [`Outcome::Render`]                    |
//!
//! Loading is the only transient state. Guards fail closed: missing roles or
//! permission data deny.

use serde::Serialize;
use tokio::sync::watch;

use crate::config::Access;
use crate::gate::Requirement;
use crate::role::Role;
use crate::session::{SessionProvider, SessionState};
use crate::user::User;

/// Why navigation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    Unauthenticated,
    Unauthorized,
}

/// Where denied navigation goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub reason: Denial,
    /// Full target, including the return-path query for login redirects.
    pub location: String,
    /// Originally requested path, kept so login can resume it.
    pub from: Option<String>,
}

impl Redirect {
    pub fn to_login(access: &Access, requested: &str) -> Self {
        let separator = if access.login_path.contains('?') { '&' } else { '?' };
        let location = format!(
            "{}{separator}{}={}",
            access.login_path,
            access.redirect_param,
            urlencoding::encode(requested)
        );
        Self {
            reason: Denial::Unauthenticated,
            location,
            from: Some(requested.to_string()),
        }
    }

    pub fn to_unauthorized(access: &Access) -> Self {
        Self {
            reason: Denial::Unauthorized,
            location: access.unauthorized_path.clone(),
            from: None,
        }
    }
}

/// Result of evaluating a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Loading,
    Redirect(Redirect),
    Render,
}

impl Outcome {
    pub fn is_render(&self) -> bool {
        matches!(self, Outcome::Render)
    }
}

/// A route-level authorization check.
pub trait Guard: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Decide for a resolved, authenticated user.
    fn authorize(&self, user: &User) -> bool;

    fn evaluate(&self, session: &SessionState, requested: &str, access: &Access) -> Outcome {
        match session {
            SessionState::Loading => Outcome::Loading,
            SessionState::Unauthenticated => {
                tracing::debug!(guard = self.name(), path = requested, "not signed in");
                Outcome::Redirect(Redirect::to_login(access, requested))
            }
            SessionState::Authenticated(user) if self.authorize(user) => Outcome::Render,
            SessionState::Authenticated(user) => {
                tracing::debug!(guard = self.name(), path = requested, user = %user.id, "access denied");
                Outcome::Redirect(Redirect::to_unauthorized(access))
            }
        }
    }
}

/// Requires a signed-in user and, optionally, a permission requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthGuard {
    requirement: Option<Requirement>,
}

impl AuthGuard {
    /// Any signed-in user passes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring(requirement: impl Into<Requirement>) -> Self {
        Self {
            requirement: Some(requirement.into()),
        }
    }
}

impl Guard for AuthGuard {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn authorize(&self, user: &User) -> bool {
        self.requirement
            .as_ref()
            .is_none_or(|req| req.is_met_by(Some(user)))
    }
}

/// How a [`RoleGuard`] compares the user's role with the accepted list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleMatch {
    /// The user's role must be listed.
    #[default]
    Exact,
    /// The user's role must include (rank at or above) a listed role.
    AtLeast,
}

/// Grants access by role identity rather than by permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGuard {
    roles: Vec<Role>,
    matching: RoleMatch,
}

impl RoleGuard {
    pub fn new(role: Role) -> Self {
        Self::any_of([role])
    }

    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            matching: RoleMatch::Exact,
        }
    }

    /// Build from role names; unrecognized names are dropped and never match.
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let roles = names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let role = Role::parse(name);
                if role.is_none() {
                    tracing::debug!(role = name, "ignoring unrecognized role in guard");
                }
                role
            })
            .collect::<Vec<_>>();
        Self::any_of(roles)
    }

    /// Switch to hierarchy-aware matching.
    pub fn at_least(mut self) -> Self {
        self.matching = RoleMatch::AtLeast;
        self
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Guard for RoleGuard {
    fn name(&self) -> &'static str {
        "role"
    }

    fn authorize(&self, user: &User) -> bool {
        let Some(role) = user.role() else {
            return false;
        };
        match self.matching {
            RoleMatch::Exact => self.roles.contains(&role),
            RoleMatch::AtLeast => self.roles.iter().any(|&wanted| role.includes(wanted)),
        }
    }
}

/// A guard attached to a live session feed.
///
/// Each session change re-runs the guard from scratch. Dropping the mounted
/// guard drops its subscription.
pub struct Mounted<G> {
    guard: G,
    requested: String,
    access: Access,
    rx: watch::Receiver<SessionState>,
}

impl<G: Guard> Mounted<G> {
    pub fn mount(
        guard: G,
        provider: &dyn SessionProvider,
        requested: impl Into<String>,
        access: Access,
    ) -> Self {
        Self {
            guard,
            requested: requested.into(),
            access,
            rx: provider.subscribe(),
        }
    }

    /// Outcome for the latest session snapshot.
    pub fn outcome(&self) -> Outcome {
        let session = self.rx.borrow();
        self.guard.evaluate(&session, &self.requested, &self.access)
    }

    /// Wait for the next session change and return the new outcome.
    ///
    /// Returns `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<Outcome> {
        self.rx.changed().await.ok()?;
        Some(self.outcome())
    }
}
