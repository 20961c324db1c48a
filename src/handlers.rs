use crate::{
    AppState,
    api::ApiError,
    auth::AuthSession,
    error::PortalError,
    guard::{Location, Redirect},
    models::{
        AuthResponse, Conversation, Document, ForgotRequest, LoginRequest, LoginSessionRequest,
        MessageResponse, PopulateRequest, RedirectResponse, RegisterRequest, SessionView,
        SetRoleRequest, TextPayload, TranscriptSearchRequest, ViewData, ViewResponse,
    },
    session::{Session, SessionState},
    shell::{Routed, View},
    validation,
};
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

// --- Query Structs ---

/// ViewParams
///
/// Query parameters understood by the rendered views. Only the transcripts view
/// uses one today (`?phone=` pre-fills and runs the lookup).
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub phone: Option<String>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        SessionView {
            authenticated: session.is_authenticated(),
            role: session.role,
        }
    }
}

// --- Session Handlers ---

/// get_session
///
/// [Public Route] Current session state. Never includes the token.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session(State(sessions): State<SessionState>) -> Json<SessionView> {
    Json(SessionView::from(&sessions.current()))
}

/// login_session
///
/// [Public Route] Adopts a token/role pair that the identity provider already
/// validated. Makes no network call.
#[utoipa::path(
    post,
    path = "/api/session",
    request_body = LoginSessionRequest,
    responses(
        (status = 200, description = "Session established", body = SessionView),
        (status = 400, description = "Empty token", body = MessageResponse)
    )
)]
pub async fn login_session(
    State(sessions): State<SessionState>,
    Json(payload): Json<LoginSessionRequest>,
) -> Result<Json<SessionView>, PortalError> {
    let session = sessions.login(&payload.token, payload.role)?;
    Ok(Json(SessionView::from(&session)))
}

/// logout_session
///
/// [Public Route] Idempotent: logging out twice is the same as once.
#[utoipa::path(
    delete,
    path = "/api/session",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout_session(State(sessions): State<SessionState>) -> StatusCode {
    sessions.logout();
    StatusCode::NO_CONTENT
}

/// set_role
///
/// [Authenticated Route] Local role correction without re-authenticating.
#[utoipa::path(
    put,
    path = "/api/session/role",
    request_body = SetRoleRequest,
    responses(
        (status = 204, description = "Role updated"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn set_role(
    _auth: AuthSession,
    State(sessions): State<SessionState>,
    Json(payload): Json<SetRoleRequest>,
) -> StatusCode {
    sessions.set_role(payload.role);
    StatusCode::NO_CONTENT
}

// --- Auth Screen Handlers ---

/// login
///
/// [Public Route] Login screen submission. After inline validation the session is
/// established and the caller is sent back to where the Route Guard intercepted it
/// (`from`), or home when `from` is missing or points outside the portal.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 422, description = "Invalid form", body = validation::ValidationError)
    )
)]
pub async fn login(
    State(sessions): State<SessionState>,
    Json(form): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, PortalError> {
    validation::validate_login(&form)?;
    let session = sessions.login(&form.token, form.role)?;

    let redirect_to = form
        .from
        .as_ref()
        .filter(|from| from.is_in_app())
        .map(Location::href)
        .unwrap_or_else(|| "/".to_string());
    Ok(Json(AuthResponse {
        session: SessionView::from(&session),
        redirect_to,
    }))
}

/// register
///
/// [Public Route] Registration screen submission (client or company account).
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and logged in", body = AuthResponse),
        (status = 422, description = "Invalid form", body = validation::ValidationError)
    )
)]
pub async fn register(
    State(sessions): State<SessionState>,
    Json(form): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, PortalError> {
    validation::validate_register(&form)?;
    let session = sessions.login(&form.token, form.role)?;
    Ok(Json(AuthResponse {
        session: SessionView::from(&session),
        redirect_to: "/".to_string(),
    }))
}

/// forgot_password
///
/// [Public Route] Password recovery request. The reset mail itself is the identity
/// provider's job; the portal only validates the address.
#[utoipa::path(
    post,
    path = "/api/auth/forgot",
    request_body = ForgotRequest,
    responses(
        (status = 202, description = "Accepted", body = MessageResponse),
        (status = 422, description = "Invalid email", body = validation::ValidationError)
    )
)]
pub async fn forgot_password(
    Json(form): Json<ForgotRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), PortalError> {
    validation::validate_forgot(&form)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "If an account exists for this email, a reset link has been sent.".to_string(),
        }),
    ))
}

// --- Data Action Handlers ---

/// search_transcripts
///
/// [Authenticated Route] Chatbot transcripts for a caller's phone number.
#[utoipa::path(
    post,
    path = "/api/transcripts/search",
    request_body = TranscriptSearchRequest,
    responses(
        (status = 200, description = "Conversations", body = [Conversation]),
        (status = 401, description = "Not logged in"),
        (status = 422, description = "Invalid phone number", body = validation::ValidationError),
        (status = 502, description = "Backend failure", body = MessageResponse)
    )
)]
pub async fn search_transcripts(
    State(state): State<AppState>,
    Json(payload): Json<TranscriptSearchRequest>,
) -> Result<Json<Vec<Conversation>>, PortalError> {
    let phone = validation::validate_phone(&payload.phone)?;
    let conversations = state.api.conversations_by_phone(&phone).await?;
    Ok(Json(conversations))
}

/// upload_document
///
/// [Admin Route] Forwards a PDF (multipart field `file`) to the backend, which
/// stores and indexes it.
#[utoipa::path(
    post,
    path = "/api/admin/upload",
    responses(
        (status = 201, description = "Indexed", body = Document),
        (status = 403, description = "Not an admin"),
        (status = 422, description = "Not a PDF", body = validation::ValidationError)
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), PortalError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PortalError::MalformedPayload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        validation::validate_pdf_name(&file_name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PortalError::MalformedPayload(e.to_string()))?;

        tracing::info!(%file_name, size = bytes.len(), "uploading document for indexing");
        let document = state.api.upload_and_index(file_name, bytes.to_vec()).await?;
        return Ok((StatusCode::CREATED, Json(document)));
    }
    Err(PortalError::MalformedPayload("missing `file` field".to_string()))
}

/// populate_collection
///
/// [Admin Route] Indexes already-stored PDFs into a fresh collection.
#[utoipa::path(
    post,
    path = "/api/admin/populate",
    request_body = PopulateRequest,
    responses(
        (status = 200, description = "Collection id", body = TextPayload),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn populate_collection(
    State(state): State<AppState>,
    Json(payload): Json<PopulateRequest>,
) -> Result<Json<TextPayload>, PortalError> {
    if payload.paths.is_empty() {
        return Err(PortalError::MalformedPayload("`paths` must not be empty".to_string()));
    }
    let text = state.api.populate_chroma(payload.paths).await?;
    Ok(Json(TextPayload { text }))
}

// --- Navigation ---

/// navigate
///
/// [Navigation] Every GET that no other route claims. The navigation shell decides
/// between rendering a view (200 + view descriptor with its data) and redirecting
/// (307 + `Location`, with the redirect state in the body).
pub async fn navigate(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ViewParams>,
) -> Response {
    let location = Location::parse(uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"));
    let session = state.session.current();
    let navigation = state.shell.navigate(&session, &location);

    match navigation.routed {
        Routed::Redirect(redirect) => redirect_response(redirect),
        Routed::Render(view) => {
            let (data, error) = load_view(&state, view, &params).await;
            Json(ViewResponse {
                view,
                location: navigation.location,
                chrome: navigation.chrome,
                data,
                error,
            })
            .into_response()
        }
    }
}

fn redirect_response(redirect: Redirect) -> Response {
    (
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, redirect.to.clone())],
        Json(RedirectResponse { redirect }),
    )
        .into_response()
}

async fn load_view(
    state: &AppState,
    view: View,
    params: &ViewParams,
) -> (Option<ViewData>, Option<String>) {
    let api = &state.api;
    match view {
        View::Home => settle(
            api.recent_documents(state.config.recent_documents_limit)
                .await
                .map(ViewData::Documents),
            Some("Could not load recently uploaded documents."),
        ),
        View::Documents => settle(
            api.documents(false).await.map(ViewData::Documents),
            Some("Could not load documents."),
        ),
        View::Deleted => settle(
            api.documents(true)
                .await
                .map(|docs| ViewData::Documents(docs.into_iter().filter(|d| d.deleted).collect())),
            Some("Could not load deleted documents."),
        ),
        View::Forms => settle(api.forms().await.map(ViewData::Forms), None),
        View::Transcripts => match params.phone.as_deref() {
            None => (None, None),
            Some(phone) => match validation::validate_phone(phone) {
                Err(err) => (None, Some(err.summary)),
                Ok(phone) => settle(
                    api.conversations_by_phone(&phone)
                        .await
                        .map(ViewData::Conversations),
                    None,
                ),
            },
        },
        View::Login | View::Register | View::Forgot | View::Upload => (None, None),
    }
}

// A failed load keeps the view; the error becomes its one-line message.
fn settle(
    result: Result<ViewData, ApiError>,
    fixed_message: Option<&str>,
) -> (Option<ViewData>, Option<String>) {
    match result {
        Ok(data) => (Some(data), None),
        Err(err) => {
            tracing::warn!(error = %err, "view data could not be loaded");
            let message = fixed_message.map(str::to_string).unwrap_or_else(|| err.to_string());
            (None, Some(message))
        }
    }
}
