//! Admin API: the caller's capabilities, the gated admin sidebar, and the
//! role catalog.

use serde::Serialize;

use crate::gate::{Gate, Requirement};
use crate::guard::{AuthGuard, RoleGuard};
use crate::module::Module;
use crate::permission::{self, Permission};
use crate::role::Role;
use crate::router::Router;
use crate::user::User;

/// A sidebar entry, optionally hidden behind a gate.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub name: &'static str,
    pub path: &'static str,
    pub gate: Option<Gate>,
    pub children: Vec<NavItem>,
}

impl NavItem {
    fn link(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            gate: None,
            children: Vec::new(),
        }
    }

    fn gated(mut self, requirement: impl Into<Requirement>) -> Self {
        self.gate = Some(Gate::new(requirement));
        self
    }

    fn with_children(mut self, children: Vec<NavItem>) -> Self {
        self.children = children;
        self
    }

    fn visible_to(&self, user: Option<&User>) -> bool {
        self.gate.as_ref().is_none_or(|gate| gate.allows(user))
    }
}

/// The admin sidebar as shown to someone with every permission.
pub fn sidebar() -> Vec<NavItem> {
    vec![
        NavItem::link("Dashboard", "/admin"),
        NavItem::link("Hymns", "/admin/songs")
            .gated(Permission::ContentRead)
            .with_children(vec![
                NavItem::link("All Hymns", "/admin/songs"),
                NavItem::link("Add New Hymn", "/admin/songs/new").gated(Permission::ContentCreate),
            ]),
        NavItem::link("Authors", "/admin/authors")
            .gated(Permission::ContentRead)
            .with_children(vec![
                NavItem::link("All Authors", "/admin/authors"),
                NavItem::link("Add New Author", "/admin/authors/new")
                    .gated(Permission::ContentCreate),
            ]),
        NavItem::link("Categories", "/admin/categories")
            .gated(Permission::ContentRead)
            .with_children(vec![
                NavItem::link("All Categories", "/admin/categories"),
                NavItem::link("Add New Category", "/admin/categories/new")
                    .gated(Permission::ContentCreate),
            ]),
        NavItem::link("PDF Files", "/admin/pdfs").gated(Requirement::any_of([
            Permission::ContentCreate,
            Permission::ContentUpdate,
        ])),
        NavItem::link("Users", "/admin/users").gated(Permission::UsersRead),
        NavItem::link("Roles", "/admin/roles").gated(Permission::SystemSettings),
        NavItem::link("Settings", "/admin/settings").gated(Permission::SystemSettings),
    ]
}

/// Sidebar entry as sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub name: &'static str,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

/// Filter `items` down to what `user` may see. Hidden parents hide children.
pub fn navigation_for(items: &[NavItem], user: Option<&User>) -> Vec<NavEntry> {
    items
        .iter()
        .filter(|item| item.visible_to(user))
        .map(|item| NavEntry {
            name: item.name,
            path: item.path,
            children: navigation_for(&item.children, user),
        })
        .collect()
}

/// What the signed-in user may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub id: String,
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
}

impl Capabilities {
    pub fn of(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role(),
            permissions: permission::effective_permissions(Some(user)),
        }
    }
}

/// A role and its default permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub role: Role,
    pub permissions: &'static [Permission],
    /// Whether the evaluator bypasses checks for this role.
    pub bypass: bool,
}

pub fn role_catalog() -> Vec<RoleSummary> {
    Role::ALL
        .into_iter()
        .rev()
        .map(|role| RoleSummary {
            role,
            permissions: role.default_permissions(),
            bypass: role == Role::Admin,
        })
        .collect()
}

/// Routes under `/api/me` and `/api/admin`.
pub struct AdminModule;

impl Module for AdminModule {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn routes(&self, router: &mut Router) {
        router.get_guarded("/api/me/permissions", AuthGuard::new(), |ctx| async move {
            let user = ctx.require_user()?;
            crate::response::ok(&Capabilities::of(user))
        });

        router.get_guarded(
            "/api/admin/navigation",
            RoleGuard::any_of([Role::Admin, Role::Editor]),
            |ctx| async move {
                let nav = navigation_for(&sidebar(), ctx.user());
                crate::response::ok(&serde_json::json!({ "items": nav }))
            },
        );

        router.get_guarded(
            "/api/admin/roles",
            AuthGuard::requiring(Permission::SystemSettings),
            |_ctx| async move { crate::response::ok(&serde_json::json!({ "roles": role_catalog() })) },
        );
    }
}
