//! Navigation gates: the private-area Route Guard and the inverse Public-Only Gate.
//!
//! Both are pure functions of the current session and the requested location.
//! They never touch the session store and never await; the navigation shell
//! evaluates them once per navigation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::session::{Role, Session};

/// A requested location: path plus the raw query string, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Location {
    pub pathname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: None,
        }
    }

    /// Splits `"/path?query"` into its parts. An empty path becomes `/`.
    pub fn parse(path_and_query: &str) -> Self {
        let (path, search) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
            None => (path_and_query, None),
        };
        Self {
            pathname: if path.is_empty() { "/".to_string() } else { path.to_string() },
            search: search.map(str::to_string),
        }
    }

    /// True for paths inside the portal: a single leading `/`, never `//` or `/\`,
    /// which browsers treat as another host.
    pub fn is_in_app(&self) -> bool {
        let path = self.pathname.as_str();
        path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
    }

    pub fn href(&self) -> String {
        match &self.search {
            Some(search) => format!("{}?{}", self.pathname, search),
            None => self.pathname.clone(),
        }
    }
}

/// Navigation state attached to a redirect, so the target can send the user back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RedirectState {
    pub from: Location,
}

/// Redirect
///
/// A navigational outcome, never an error. `replace` means the blocked entry must
/// not stay in history (no back-navigation into the gate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Redirect {
    pub to: String,
    pub replace: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RedirectState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    Redirect(Redirect),
}

/// Landings
///
/// Fixed redirect targets used by the gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landings {
    /// Where unauthenticated sessions are sent.
    pub login: String,
    /// Where authenticated sessions with a disallowed role are sent.
    pub role_rejection: String,
    /// Public-Only Gate target for admins.
    pub admin: String,
    /// Public-Only Gate target for normal users.
    pub normal: String,
}

impl Default for Landings {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            role_rejection: "/".to_string(),
            admin: "/".to_string(),
            normal: "/transcripts".to_string(),
        }
    }
}

impl Landings {
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin,
            Role::Normal => &self.normal,
        }
    }
}

/// Why the Route Guard refused a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    RoleNotAllowed,
}

/// RouteGuard
///
/// Gates authenticated views, optionally restricted to a role subset. `allowed: None`
/// admits any authenticated role.
///
/// Authentication is checked strictly before role: an unauthenticated session is
/// always sent to login, never to the role-rejection target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteGuard {
    allowed: Option<Vec<Role>>,
}

impl RouteGuard {
    pub fn any_authenticated() -> Self {
        Self { allowed: None }
    }

    pub fn allowing(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: Some(roles.into_iter().collect()),
        }
    }

    pub fn authorize(&self, session: &Session) -> Result<(), Denial> {
        if !session.is_authenticated() {
            return Err(Denial::Unauthenticated);
        }
        match &self.allowed {
            Some(allowed) if !allowed.contains(&session.role) => Err(Denial::RoleNotAllowed),
            _ => Ok(()),
        }
    }

    pub fn evaluate(&self, session: &Session, location: &Location, landings: &Landings) -> GuardOutcome {
        match self.authorize(session) {
            Ok(()) => GuardOutcome::Render,
            Err(Denial::Unauthenticated) => GuardOutcome::Redirect(Redirect {
                to: landings.login.clone(),
                replace: true,
                state: Some(RedirectState {
                    from: location.clone(),
                }),
            }),
            Err(Denial::RoleNotAllowed) => GuardOutcome::Redirect(Redirect {
                to: landings.role_rejection.clone(),
                replace: true,
                state: None,
            }),
        }
    }
}

/// PublicOnlyGate
///
/// Keeps authenticated sessions off the login/register/recovery screens by sending
/// them to their role's landing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicOnlyGate;

impl PublicOnlyGate {
    pub fn evaluate(&self, session: &Session, location: &Location, landings: &Landings) -> GuardOutcome {
        if !session.is_authenticated() {
            return GuardOutcome::Render;
        }
        GuardOutcome::Redirect(Redirect {
            to: landings.for_role(session.role).to_string(),
            replace: true,
            state: Some(RedirectState {
                from: location.clone(),
            }),
        })
    }
}

/// Capability
///
/// What a route demands of the session. Declared statically per route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Public,
    PublicOnly,
    AnyAuthenticated,
    RoleIn(Vec<Role>),
}

impl Capability {
    pub fn evaluate(&self, session: &Session, location: &Location, landings: &Landings) -> GuardOutcome {
        match self {
            Capability::Public => GuardOutcome::Render,
            Capability::PublicOnly => PublicOnlyGate.evaluate(session, location, landings),
            Capability::AnyAuthenticated => {
                RouteGuard::any_authenticated().evaluate(session, location, landings)
            }
            Capability::RoleIn(roles) => {
                RouteGuard::allowing(roles.iter().copied()).evaluate(session, location, landings)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anonymous_sessions() -> Vec<Session> {
        vec![
            Session::default(),
            Session { token: None, role: Role::Admin },
            Session { token: Some(String::new()), role: Role::Admin },
            Session { token: Some(String::new()), role: Role::Normal },
        ]
    }

    fn guards() -> Vec<RouteGuard> {
        vec![
            RouteGuard::any_authenticated(),
            RouteGuard::allowing([Role::Admin]),
            RouteGuard::allowing([Role::Normal]),
            RouteGuard::allowing([]),
        ]
    }

    #[test]
    fn anonymous_always_goes_to_login() {
        let landings = Landings::default();
        let location = Location::new("/documents");
        for session in anonymous_sessions() {
            for guard in guards() {
                let outcome = guard.evaluate(&session, &location, &landings);
                assert_eq!(
                    outcome,
                    GuardOutcome::Redirect(Redirect {
                        to: "/login".to_string(),
                        replace: true,
                        state: Some(RedirectState { from: location.clone() }),
                    }),
                    "{session:?} / {guard:?}"
                );
            }
        }
    }

    #[test]
    fn disallowed_role_goes_to_landing_not_login() {
        let session = Session::authenticated("x", Role::Normal);
        let outcome = RouteGuard::allowing([Role::Admin]).evaluate(
            &session,
            &Location::new("/documents"),
            &Landings::default(),
        );
        match outcome {
            GuardOutcome::Redirect(redirect) => {
                assert_eq!(redirect.to, "/");
                assert!(redirect.replace);
            }
            GuardOutcome::Render => panic!("protected content rendered for disallowed role"),
        }
    }

    #[test]
    fn permitted_sessions_render() {
        let landings = Landings::default();
        let location = Location::new("/upload");
        let admin = Session::authenticated("x", Role::Admin);
        let normal = Session::authenticated("y", Role::Normal);

        assert_eq!(RouteGuard::allowing([Role::Admin]).evaluate(&admin, &location, &landings), GuardOutcome::Render);
        assert_eq!(RouteGuard::any_authenticated().evaluate(&normal, &location, &landings), GuardOutcome::Render);
        assert_eq!(
            RouteGuard::allowing([Role::Admin, Role::Normal]).evaluate(&normal, &location, &landings),
            GuardOutcome::Render
        );
    }

    #[test]
    fn public_only_never_renders_for_authenticated() {
        let landings = Landings::default();
        let location = Location::parse("/login?next=1");
        for (role, target) in [(Role::Normal, "/transcripts"), (Role::Admin, "/")] {
            let outcome = PublicOnlyGate.evaluate(&Session::authenticated("x", role), &location, &landings);
            assert_eq!(
                outcome,
                GuardOutcome::Redirect(Redirect {
                    to: target.to_string(),
                    replace: true,
                    state: Some(RedirectState { from: location.clone() }),
                })
            );
        }
    }

    #[test]
    fn public_only_renders_for_anonymous() {
        for session in anonymous_sessions() {
            assert_eq!(
                PublicOnlyGate.evaluate(&session, &Location::new("/register"), &Landings::default()),
                GuardOutcome::Render
            );
        }
    }

    #[test]
    fn location_parse_and_href() {
        let location = Location::parse("/transcripts?phone=123");
        assert_eq!(location.pathname, "/transcripts");
        assert_eq!(location.search.as_deref(), Some("phone=123"));
        assert_eq!(location.href(), "/transcripts?phone=123");

        assert_eq!(Location::parse(""), Location::new("/"));
        assert_eq!(Location::parse("/forms?"), Location::new("/forms"));
    }

    #[test]
    fn only_single_slash_paths_are_in_app() {
        assert!(Location::new("/").is_in_app());
        assert!(Location::parse("/documents?page=2").is_in_app());
        assert!(!Location::new("//evil.example").is_in_app());
        assert!(!Location::new("/\\evil.example").is_in_app());
        assert!(!Location::new("https://evil.example").is_in_app());
        assert!(!Location::new("").is_in_app());
    }
}
