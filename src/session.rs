//! Session state and the provider interface guards consume.
//!
//! The identity provider is the only writer of session state. Guards and
//! handlers read snapshots through a [`SessionProvider`] that is passed to
//! them explicitly, so tests can hand in fixed fixtures.

use std::sync::Arc;

use hyper::http::HeaderMap;
use tokio::sync::watch;

use crate::config::Auth as AuthConfig;
use crate::error::Error;
use crate::user::User;

/// Resolution status of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The provider has not answered yet.
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(Arc<User>),
}

impl SessionState {
    pub fn authenticated(user: User) -> Self {
        SessionState::Authenticated(Arc::new(user))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    /// Resolve a request's session from its bearer token.
    ///
    /// Never returns [`SessionState::Loading`]: a missing, malformed or
    /// expired token is simply unauthenticated.
    pub fn from_headers(headers: &HeaderMap, config: &AuthConfig) -> Self {
        match crate::auth::extract_user(headers, config) {
            Ok(user) => SessionState::authenticated(user),
            Err(Error::Config(msg)) => {
                tracing::error!("Session resolution misconfigured: {msg}");
                SessionState::Unauthenticated
            }
            Err(_) => SessionState::Unauthenticated,
        }
    }
}

/// Read access to the shared session.
pub trait SessionProvider: Send + Sync {
    /// Current snapshot.
    fn current(&self) -> SessionState;

    /// Change feed. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<SessionState>;
}

/// In-process session holder backed by a watch channel.
///
/// Starts in [`SessionState::Loading`] until the identity integration
/// publishes the first resolved state.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Loading);
        Self { tx }
    }

    /// Store with an already-resolved state.
    pub fn resolved(state: SessionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    /// Publish a new state to every subscriber.
    pub fn publish(&self, state: SessionState) {
        self.tx.send_replace(state);
    }

    pub fn sign_in(&self, user: User) {
        self.publish(SessionState::authenticated(user));
    }

    pub fn sign_out(&self) {
        self.publish(SessionState::Unauthenticated);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for SessionStore {
    fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
