use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{TimeZone, Utc};
use insurai_portal::{
    AppState, MockApiService,
    api::ApiService,
    config::AppConfig,
    guard::Location,
    handlers,
    models::{
        Document, ForgotRequest, LoginRequest, LoginSessionRequest, PopulateRequest,
        TranscriptSearchRequest,
    },
    session::{Role, Session, SessionStore},
    storage::MemoryStorage,
};
use std::sync::Arc;

// --- Test Helpers ---

fn document(id: i64, name: &str, day: u32, deleted: bool) -> Document {
    Document {
        id,
        name: name.to_string(),
        path: format!("tmp_databases/{name}"),
        collection: Some(format!("docs_{id}")),
        uploaded_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
        deleted,
    }
}

fn app_state(api: MockApiService) -> AppState {
    let session = Arc::new(SessionStore::initialize(Arc::new(MemoryStorage::new())));
    AppState::new(session, Arc::new(api), AppConfig::default())
}

fn login_form(from: Option<Location>) -> LoginRequest {
    LoginRequest {
        username: "agent".to_string(),
        password: "secret1".to_string(),
        token: "issued".to_string(),
        role: Role::Normal,
        from,
    }
}

// --- Session Handlers ---

#[tokio::test]
async fn test_login_session_then_read() {
    let state = app_state(MockApiService::new());

    let Json(view) = handlers::login_session(
        State(state.session.clone()),
        Json(LoginSessionRequest {
            token: "t1".to_string(),
            role: Role::Admin,
        }),
    )
    .await
    .unwrap();
    assert!(view.authenticated);
    assert_eq!(view.role, Role::Admin);

    assert_eq!(state.session.current(), Session::authenticated("t1", Role::Admin));
}

#[tokio::test]
async fn test_login_session_rejects_empty_token() {
    let state = app_state(MockApiService::new());

    let result = handlers::login_session(
        State(state.session.clone()),
        Json(LoginSessionRequest {
            token: String::new(),
            role: Role::Normal,
        }),
    )
    .await;

    let response = result.unwrap_err().into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!state.session.current().is_authenticated());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let state = app_state(MockApiService::new());
    state.session.login("t1", Role::Normal).unwrap();

    for _ in 0..2 {
        let status = handlers::logout_session(State(state.session.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let Json(view) = handlers::get_session(State(state.session.clone())).await;
        assert!(!view.authenticated);
        assert_eq!(view.role, Role::Normal);
    }
}

// --- Auth Screen Handlers ---

#[tokio::test]
async fn test_login_returns_to_intercepted_location() {
    let state = app_state(MockApiService::new());
    let from = Location::parse("/documents?page=2");

    let Json(response) = handlers::login(State(state.session.clone()), Json(login_form(Some(from))))
        .await
        .unwrap();

    assert_eq!(response.redirect_to, "/documents?page=2");
    assert!(response.session.authenticated);
}

#[tokio::test]
async fn test_login_defaults_to_home() {
    let state = app_state(MockApiService::new());
    let Json(response) = handlers::login(State(state.session.clone()), Json(login_form(None)))
        .await
        .unwrap();
    assert_eq!(response.redirect_to, "/");
}

#[tokio::test]
async fn test_login_ignores_off_site_return_location() {
    let state = app_state(MockApiService::new());

    for from in ["//evil.example/phish", "/\\evil.example", "https://evil.example/", "evil"] {
        let Json(response) = handlers::login(
            State(state.session.clone()),
            Json(login_form(Some(Location::new(from)))),
        )
        .await
        .unwrap();
        assert_eq!(response.redirect_to, "/", "followed {from}");
    }
}

#[tokio::test]
async fn test_login_validation_blocks_submission() {
    let state = app_state(MockApiService::new());
    let mut form = login_form(None);
    form.password = "123".to_string();

    let response = handlers::login(State(state.session.clone()), Json(form))
        .await
        .unwrap_err()
        .into_response();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    // Validation failed, so no session was established.
    assert!(!state.session.current().is_authenticated());
}

#[tokio::test]
async fn test_forgot_password_accepts_valid_email() {
    let (status, _) = handlers::forgot_password(Json(ForgotRequest {
        email: "jane@example.com".to_string(),
    }))
    .await
    .unwrap();
    assert_eq!(status, StatusCode::ACCEPTED);

    let rejected = handlers::forgot_password(Json(ForgotRequest {
        email: "jane@".to_string(),
    }))
    .await;
    assert!(rejected.is_err());
}

// --- Data Action Handlers ---

#[tokio::test]
async fn test_search_transcripts_trims_phone() {
    let mut api = MockApiService::new();
    api.conversations = serde_json::from_value(serde_json::json!([{
        "id": "2f1c7a8e-3f59-4a8a-9a51-6a3e6c1d9b10",
        "phone_number": "+40774596204",
        "started_at": "2025-05-02T09:15:00+00:00",
        "messages": []
    }]))
    .unwrap();
    let state = app_state(api);

    let Json(conversations) = handlers::search_transcripts(
        State(state),
        Json(TranscriptSearchRequest {
            phone: "  +40774596204 ".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(conversations.len(), 1);
}

#[tokio::test]
async fn test_search_transcripts_backend_failure_is_one_line() {
    let state = app_state(MockApiService::new_failing());

    let response = handlers::search_transcripts(
        State(state),
        Json(TranscriptSearchRequest {
            phone: "+40774596204".to_string(),
        }),
    )
    .await
    .unwrap_err()
    .into_response();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_populate_requires_paths() {
    let state = app_state(MockApiService::new());

    let rejected = handlers::populate_collection(
        State(state.clone()),
        Json(PopulateRequest { paths: vec![] }),
    )
    .await;
    assert_eq!(rejected.unwrap_err().into_response().status(), StatusCode::BAD_REQUEST);

    let Json(payload) = handlers::populate_collection(
        State(state),
        Json(PopulateRequest {
            paths: vec!["tmp_databases/policy.pdf".to_string()],
        }),
    )
    .await
    .unwrap();
    assert_eq!(payload.text, "docs_mock");
}

#[tokio::test]
async fn test_mock_documents_are_newest_first_without_deleted() {
    let mut api = MockApiService::new();
    api.documents = vec![
        document(1, "old.pdf", 1, false),
        document(2, "gone.pdf", 3, true),
        document(3, "new.pdf", 2, false),
    ];

    let docs = api.documents(false).await.unwrap();
    let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["new.pdf", "old.pdf"]);

    assert_eq!(api.documents(true).await.unwrap().len(), 3);
    assert_eq!(api.recent_documents(1).await.unwrap()[0].name, "new.pdf");
}
