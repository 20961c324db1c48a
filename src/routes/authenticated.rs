use crate::{
    AppState,
    guard::Capability,
    handlers,
    shell::{RouteDescriptor, View},
};
use axum::{
    Router,
    routing::{post, put},
};

/// The home (dashboard) view. Also the navigation fallback.
pub fn home() -> RouteDescriptor {
    RouteDescriptor::new("/", View::Home, Capability::AnyAuthenticated)
}

/// Authenticated Views
///
/// Any logged-in role may render these. `/transcripts` is the normal user's landing.
pub fn authenticated_views() -> Vec<RouteDescriptor> {
    vec![
        home(),
        RouteDescriptor::new("/transcripts", View::Transcripts, Capability::AnyAuthenticated),
        RouteDescriptor::new("/forms", View::Forms, Capability::AnyAuthenticated),
    ]
}

/// Authenticated Router Module
///
/// Actions for any logged-in session. The whole router is wrapped in
/// `auth::require_session` by `create_router`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // PUT /api/session/role
        // Local role correction without re-authenticating.
        .route("/api/session/role", put(handlers::set_role))
        // POST /api/transcripts/search
        // Chatbot transcripts for a phone number.
        .route("/api/transcripts/search", post(handlers::search_transcripts))
}
