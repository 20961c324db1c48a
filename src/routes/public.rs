use crate::{
    AppState,
    guard::Capability,
    handlers,
    shell::{RouteDescriptor, View},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Paths of the auth screens. Chrome is suppressed on them.
pub const AUTH_PATHS: [&str; 3] = ["/login", "/register", "/forgot"];

/// Public Views
///
/// Wrapped by the Public-Only Gate: an authenticated session visiting any of them
/// is sent to its role's landing view.
pub fn public_views() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/login", View::Login, Capability::PublicOnly),
        RouteDescriptor::new("/register", View::Register, Capability::PublicOnly),
        RouteDescriptor::new("/forgot", View::Forgot, Capability::PublicOnly),
    ]
}

/// Public Router Module
///
/// Endpoints reachable without a session: health, the session lifecycle itself
/// and the auth screen submissions.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check; answers "ok" without touching the session or the backend.
        .route("/health", get(|| async { "ok" }))
        // GET/POST/DELETE /api/session
        // Read, establish (token + role already validated upstream) or clear the session.
        .route(
            "/api/session",
            get(handlers::get_session)
                .post(handlers::login_session)
                .delete(handlers::logout_session),
        )
        // POST /api/auth/login
        // Login form; answers with the location to return to.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/register
        // Client or company registration form.
        .route("/api/auth/register", post(handlers::register))
        // POST /api/auth/forgot
        // Password recovery form.
        .route("/api/auth/forgot", post(handlers::forgot_password))
}
