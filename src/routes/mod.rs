//! Router Module Index
//!
//! Organizes both halves of the portal's routing into access-segregated modules:
//! the HTTP action routes (axum routers, guarded by layers) and the navigation
//! table rows (views, guarded by the navigation shell). Each module owns the
//! routes of exactly one access level, so the capability of a route is visible
//! where it is declared.
//!
//! The view capabilities are static configuration. Changing the role model means
//! re-declaring them here; nothing is derived at runtime.
use crate::{
    guard::Landings,
    shell::{NavigationShell, RouteTable},
};

/// Screens for anonymous users only (login, register, password recovery).
pub mod public;

/// Views and actions for any logged-in session.
pub mod authenticated;

/// Views and actions restricted to the 'admin' role.
pub mod admin;

/// The complete navigation table. Unknown paths fall back to the home view.
pub fn route_table() -> RouteTable {
    let mut routes = public::public_views();
    routes.extend(authenticated::authenticated_views());
    routes.extend(admin::admin_views());
    RouteTable::new(routes, authenticated::home())
}

/// Auth screens render without the sidebar and header.
pub fn navigation_shell() -> NavigationShell {
    NavigationShell::new(route_table(), Landings::default(), public::AUTH_PATHS.to_vec())
}
