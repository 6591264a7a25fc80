//! Module trait for pluggable API modules.
//!
//! Modules register their routes, guarded or not, with the router.
//!
//! # Example
//!
//! ```ignore
//! use lectern::{Module, Router};
//! use lectern::guard::AuthGuard;
//!
//! pub struct ForumModule;
//!
//! impl Module for ForumModule {
//!     fn name(&self) -> &'static str {
//!         "forum"
//!     }
//!
//!     fn routes(&self, router: &mut Router) {
//!         router.get_guarded("/api/forum/drafts", AuthGuard::new(), |ctx| async move {
//!             lectern::response::ok(&ctx.require_user()?.id)
//!         });
//!     }
//! }
//! ```

use crate::router::Router;

/// A pluggable API module.
///
/// State is captured in the route closures, typically behind an `Arc`.
pub trait Module: Send + Sync {
    /// Module name for identification and logging.
    fn name(&self) -> &'static str;

    fn routes(&self, router: &mut Router);
}
