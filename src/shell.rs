use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::{Capability, GuardOutcome, Landings, Location, Redirect},
    session::Session,
};

/// View
///
/// Every screen the portal can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum View {
    Login,
    Register,
    Forgot,
    Home,
    Upload,
    Documents,
    Deleted,
    Transcripts,
    Forms,
}

/// Route Descriptor: one row of the static navigation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: &'static str,
    pub view: View,
    pub capability: Capability,
}

impl RouteDescriptor {
    pub fn new(path: &'static str, view: View, capability: Capability) -> Self {
        Self { path, view, capability }
    }
}

/// RouteTable
///
/// Exact-path lookup with a fallback descriptor for anything unmatched. The
/// fallback keeps its own capability, so an unknown path is gated exactly like
/// the view it falls back to.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    fallback: RouteDescriptor,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>, fallback: RouteDescriptor) -> Self {
        Self { routes, fallback }
    }

    pub fn resolve(&self, pathname: &str) -> &RouteDescriptor {
        let normalized = normalize(pathname);
        self.routes
            .iter()
            .find(|route| route.path == normalized)
            .unwrap_or(&self.fallback)
    }
}

// "/documents/" and "/documents" are the same route; "/" stays "/".
fn normalize(pathname: &str) -> &str {
    let trimmed = pathname.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Layout chrome shown around the routed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Chrome {
    pub sidebar: bool,
    pub header: bool,
}

impl Chrome {
    pub const FULL: Chrome = Chrome { sidebar: true, header: true };
    pub const NONE: Chrome = Chrome { sidebar: false, header: false };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Render(View),
    Redirect(Redirect),
}

/// The result of a single navigation: chrome for the active path, then either a
/// view to render or a redirect to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub location: Location,
    pub chrome: Chrome,
    pub routed: Routed,
}

/// NavigationShell
///
/// Composes the route table with the gates.
pub struct NavigationShell {
    table: RouteTable,
    landings: Landings,
    auth_paths: Vec<&'static str>,
}

impl NavigationShell {
    pub fn new(table: RouteTable, landings: Landings, auth_paths: Vec<&'static str>) -> Self {
        Self {
            table,
            landings,
            auth_paths,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Chrome is hidden on any path starting with an auth prefix, whatever the
    /// session state, so nothing flashes while an authenticated user is bounced off.
    pub fn chrome_for(&self, pathname: &str) -> Chrome {
        let is_auth_path = self.auth_paths.iter().any(|auth| pathname.starts_with(auth));
        if is_auth_path { Chrome::NONE } else { Chrome::FULL }
    }

    pub fn navigate(&self, session: &Session, location: &Location) -> Navigation {
        let route = self.table.resolve(&location.pathname);
        let routed = match route.capability.evaluate(session, location, &self.landings) {
            GuardOutcome::Render => Routed::Render(route.view),
            GuardOutcome::Redirect(redirect) => {
                tracing::debug!(
                    from = %location.pathname,
                    to = %redirect.to,
                    authenticated = session.is_authenticated(),
                    "navigation redirected"
                );
                Routed::Redirect(redirect)
            }
        };

        Navigation {
            location: location.clone(),
            chrome: self.chrome_for(&location.pathname),
            routed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn shell() -> NavigationShell {
        let table = RouteTable::new(
            vec![
                RouteDescriptor::new("/login", View::Login, Capability::PublicOnly),
                RouteDescriptor::new("/", View::Home, Capability::AnyAuthenticated),
                RouteDescriptor::new("/documents", View::Documents, Capability::RoleIn(vec![Role::Admin])),
            ],
            RouteDescriptor::new("/", View::Home, Capability::AnyAuthenticated),
        );
        NavigationShell::new(table, Landings::default(), vec!["/login", "/register", "/forgot"])
    }

    #[test]
    fn unknown_path_falls_back_to_home() {
        let shell = shell();
        let session = Session::authenticated("x", Role::Normal);
        let nav = shell.navigate(&session, &Location::new("/no/such/page"));
        assert_eq!(nav.routed, Routed::Render(View::Home));
        assert_eq!(nav.chrome, Chrome::FULL);
    }

    #[test]
    fn unknown_path_is_still_gated() {
        let nav = shell().navigate(&Session::default(), &Location::new("/nowhere"));
        match nav.routed {
            Routed::Redirect(redirect) => assert_eq!(redirect.to, "/login"),
            Routed::Render(view) => panic!("rendered {view:?} for anonymous session"),
        }
    }

    #[test]
    fn trailing_slash_matches_route() {
        let shell = shell();
        assert_eq!(shell.table().resolve("/documents/").view, View::Documents);
        assert_eq!(shell.table().resolve("/").view, View::Home);
    }

    #[test]
    fn chrome_hidden_on_auth_paths_regardless_of_session() {
        let shell = shell();
        for session in [Session::default(), Session::authenticated("x", Role::Admin)] {
            let nav = shell.navigate(&session, &Location::new("/login"));
            assert_eq!(nav.chrome, Chrome::NONE);
        }
        assert_eq!(shell.chrome_for("/forgot/step-2"), Chrome::NONE);
        assert_eq!(shell.chrome_for("/loginx"), Chrome::NONE);
        assert_eq!(shell.chrome_for("/register-company"), Chrome::NONE);
        assert_eq!(shell.chrome_for("/transcripts"), Chrome::FULL);
        assert_eq!(shell.chrome_for("/"), Chrome::FULL);
    }
}
