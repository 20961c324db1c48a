use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
    routing::get,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session core: storage port, session store, navigation gates, shell.
pub mod storage;
pub mod session;
pub mod guard;
pub mod shell;

// Portal services and HTTP surface.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod validation;

// Routing segregated by access level (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use api::{ApiState, BackendClient, MockApiService};
pub use config::AppConfig;
pub use session::{Role, Session, SessionState, SessionStore};
pub use shell::NavigationShell;
pub use storage::{FileStorage, MemoryStorage, StorageState};

/// ApiDoc
///
/// OpenAPI document for the portal's action endpoints, served at
/// `/api-docs/openapi.json`. Navigation (`GET` on any other path) is not listed.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::login_session, handlers::logout_session,
        handlers::set_role, handlers::login, handlers::register, handlers::forgot_password,
        handlers::search_transcripts, handlers::upload_document, handlers::populate_collection
    ),
    components(
        schemas(
            models::SessionView, models::LoginSessionRequest, models::SetRoleRequest,
            models::LoginRequest, models::RegisterRequest, models::AccountDetails,
            models::ForgotRequest, models::AuthResponse, models::MessageResponse,
            models::TranscriptSearchRequest, models::Conversation, models::Message,
            models::MessageRole, models::Document, models::Form, models::FormConversation,
            models::PopulateRequest, models::TextPayload, models::ViewResponse,
            models::ViewData, models::RedirectResponse, guard::Redirect,
            guard::RedirectState, guard::Location, shell::View, shell::Chrome,
            session::Role, validation::ValidationError, validation::FieldError,
        )
    ),
    tags(
        (name = "insurai-portal", description = "InsurAI document portal")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single container of shared services, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// The session store; the only writer of authentication state.
    pub session: SessionState,
    /// Backend document/transcript API.
    pub api: ApiState,
    /// Route table plus gates, evaluated per navigation.
    pub shell: Arc<NavigationShell>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the standard navigation table around the given services.
    pub fn new(session: SessionState, api: ApiState, config: AppConfig) -> Self {
        Self {
            session,
            api,
            shell: Arc::new(routes::navigation_shell()),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.session.clone()
    }
}

impl FromRef<AppState> for ApiState {
    fn from_ref(app_state: &AppState) -> ApiState {
        app_state.api.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the access layers and the
/// observability stack, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // The session is process-wide, so only the configured front-end may call in.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(state.config.frontend_origin.clone())
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_session,
                )),
        )
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_admin,
                )),
        )
        // Every other GET is a navigation; other methods on unknown paths get 405.
        .fallback(get(handlers::navigate))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its
/// `x-request-id`, method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
