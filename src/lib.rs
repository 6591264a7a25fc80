//! Lectern - authorization core for the hymn library, forum and admin CMS.
//!
//! - **Permission**: closed permission catalog and the evaluator
//! - **Role**: canonical roles, their default sets and privilege order
//! - **Gate**: conditional rendering on a permission requirement
//! - **Guard**: route guards that redirect denied navigation
//! - **Session**: session state and the provider guards read it from
//! - **Auth**: JWT session tokens carrying the user's profile
//! - **Router** / **Server**: hyper-based HTTP layer that runs guards
//!   before handlers
//!
//! # Example
//!
//! ```ignore
//! use lectern::config::{Loader, Overrides};
//! use lectern::{AdminModule, Module, Router};
//!
//! #[tokio::main]
//! async fn main() -> lectern::Result<()> {
//!     let config = Loader::new("LECTERN").load(None, Overrides::default())?;
//!
//!     let mut router = Router::new();
//!     AdminModule.routes(&mut router);
//!
//!     lectern::server::run(config, router.into_handle()).await
//! }
//! ```

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod guard;
pub mod module;
pub mod permission;
pub mod response;
pub mod role;
pub mod router;
pub mod server;
pub mod session;
pub mod user;

pub use admin::AdminModule;
pub use config::{Config, Loader};
pub use error::{Error, Result};
pub use gate::{Gate, Requirement};
pub use guard::{AuthGuard, Guard, Outcome, RoleGuard};
pub use module::Module;
pub use permission::{Permission, has_all_permissions, has_any_permission, has_permission};
pub use role::Role;
pub use router::{Context, Router};
pub use session::{SessionProvider, SessionState, SessionStore};
pub use user::{Profile, User};

pub use hyper::Method;
pub use serde_json::json;
