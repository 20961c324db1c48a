use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    guard::{Denial, RouteGuard},
    session::{Role, Session, SessionState},
};

/// AuthSession Extractor Result
///
/// The resolved session of a request that passed the Route Guard. Handlers use it
/// to read the role without touching the store.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

/// AuthSession Extractor Implementation
///
/// Applies `RouteGuard::any_authenticated()` to the current session. API actions
/// cannot follow a navigation redirect, so the guard's outcomes map to status codes
/// instead: unauthenticated → 401, disallowed role → 403.
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = SessionState::from_ref(state).current();
        RouteGuard::any_authenticated()
            .authorize(&session)
            .map_err(denial_status)?;
        Ok(AuthSession(session))
    }
}

pub fn denial_status(denial: Denial) -> StatusCode {
    match denial {
        Denial::Unauthenticated => StatusCode::UNAUTHORIZED,
        Denial::RoleNotAllowed => StatusCode::FORBIDDEN,
    }
}

/// require_session
///
/// Middleware for the authenticated action routes. Extracting `AuthSession` rejects
/// the request before the handler runs when nobody is logged in.
pub async fn require_session(_session: AuthSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// require_admin
///
/// Middleware for the admin action routes: authentication first, then `role = admin`.
pub async fn require_admin(
    State(sessions): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    match RouteGuard::allowing([Role::Admin]).authorize(&sessions.current()) {
        Ok(()) => next.run(request).await,
        Err(denial) => {
            tracing::debug!(path = %request.uri().path(), ?denial, "admin action refused");
            denial_status(denial).into_response()
        }
    }
}
