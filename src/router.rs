//! HTTP routing with matchit.
//!
//! Routes may carry a [`Guard`]. The server evaluates it against the
//! request's session before the handler runs, so a guarded handler only ever
//! sees authorized requests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use hyper::Method;
use serde::de::DeserializeOwned;

use crate::Result;
use crate::config::SharedConfig;
use crate::gate::{Gate, Requirement};
use crate::guard::Guard;
use crate::response::HttpResponse;
use crate::session::SessionState;
use crate::user::User;

/// Boxed future for async handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler context passed to route handlers.
pub struct Context {
    pub method: Method,
    pub uri: hyper::Uri,
    pub headers: hyper::http::HeaderMap,
    /// Route parameters (e.g., {id} from path).
    pub params: HashMap<String, String>,
    /// The request body, pre-read as bytes.
    pub body: Bytes,
    /// Session resolved from the request's bearer token.
    pub session: SessionState,
    pub config: SharedConfig,
}

impl Context {
    /// Parse the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let parsed = if self.body.is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&self.body)
        };
        parsed.map_err(|e| crate::Error::BadRequest(format!("Invalid request body: {e}")))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get a required route parameter, returning BadRequest if missing.
    pub fn require_param(&self, name: &str) -> Result<&str> {
        self.param(name)
            .ok_or_else(|| crate::Error::BadRequest(format!("Missing parameter: {name}")))
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    /// Require a signed-in user, returning Unauthorized if not present.
    pub fn require_user(&self) -> Result<&User> {
        self.user().ok_or(crate::Error::Unauthorized)
    }

    /// Require a signed-in user meeting `requirement`.
    pub fn require(&self, requirement: &Requirement) -> Result<&User> {
        let user = self.require_user()?;
        if requirement.is_met_by(Some(user)) {
            Ok(user)
        } else {
            Err(crate::Error::Forbidden {
                requirement: requirement.to_string(),
            })
        }
    }

    /// Evaluate a gate for the current user.
    pub fn gate(&self, gate: &Gate) -> bool {
        gate.allows(self.user())
    }
}

/// Handler function type.
pub type Handler = Box<dyn Fn(Context) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync>;

/// A handler with the guard protecting it.
pub struct Endpoint {
    pub handler: Handler,
    pub guard: Option<Arc<dyn Guard>>,
}

struct RouteEntry {
    endpoints: HashMap<Method, Endpoint>,
}

/// HTTP router for registering and dispatching requests.
pub struct Router {
    routes: matchit::Router<usize>,
    entries: Vec<RouteEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: matchit::Router::new(),
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, method: Method, path: &str, endpoint: Endpoint) {
        let entry_idx = match self.routes.at(path) {
            Ok(matched) => *matched.value,
            Err(_) => {
                let idx = self.entries.len();
                self.entries.push(RouteEntry {
                    endpoints: HashMap::new(),
                });
                if let Err(e) = self.routes.insert(path, idx) {
                    tracing::error!("Failed to register route {path}: {e}");
                }
                idx
            }
        };
        self.entries[entry_idx].endpoints.insert(method, endpoint);
    }

    fn boxed<F, Fut>(handler: F) -> Handler
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        Box::new(move |ctx| Box::pin(handler(ctx)))
    }

    /// Register an unguarded handler for a method and path.
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        let endpoint = Endpoint {
            handler: Self::boxed(handler),
            guard: None,
        };
        self.insert(method, path, endpoint);
    }

    /// Register a handler that only runs when `guard` renders.
    ///
    /// # Example
    /// ```ignore
    /// router.guarded(Method::GET, "/admin", RoleGuard::new(Role::Admin), |ctx| async move {
    ///     response::ok(&ctx.require_user()?.id)
    /// });
    /// ```
    pub fn guarded<G, F, Fut>(&mut self, method: Method, path: &str, guard: G, handler: F)
    where
        G: Guard + 'static,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        let endpoint = Endpoint {
            handler: Self::boxed(handler),
            guard: Some(Arc::new(guard)),
        };
        self.insert(method, path, endpoint);
    }

    pub fn get<F, Fut>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.route(Method::GET, path, handler);
    }

    pub fn post<F, Fut>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.route(Method::POST, path, handler);
    }

    /// Guarded GET.
    pub fn get_guarded<G, F, Fut>(&mut self, path: &str, guard: G, handler: F)
    where
        G: Guard + 'static,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.guarded(Method::GET, path, guard, handler);
    }

    /// Convert to a thread-safe handle for use in request handling.
    pub fn into_handle(self) -> Arc<RouterHandle> {
        Arc::new(RouterHandle {
            routes: self.routes,
            entries: self.entries,
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe router handle for use in request handling.
pub struct RouterHandle {
    routes: matchit::Router<usize>,
    entries: Vec<RouteEntry>,
}

/// Result of matching a request to a route.
pub enum RouteMatch<'a> {
    Matched {
        endpoint: &'a Endpoint,
        params: HashMap<String, String>,
    },
    /// Path matched but method not allowed.
    MethodNotAllowed,
    NotFound,
}

impl RouterHandle {
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let Ok(matched) = self.routes.at(path) else {
            return RouteMatch::NotFound;
        };
        let entry = &self.entries[*matched.value];
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        match entry.endpoints.get(method) {
            Some(endpoint) => RouteMatch::Matched { endpoint, params },
            None => RouteMatch::MethodNotAllowed,
        }
    }
}
