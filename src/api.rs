use async_trait::async_trait;
use reqwest::{StatusCode, multipart};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Conversation, Document, Form, PopulateRequest, TextPayload};

/// ApiError
///
/// Network or backend failures. `Display` is the one-line message shown next to
/// the control that triggered the call; nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
}

// 1. ApiService Contract
/// ApiService
///
/// Abstract contract for the backend document/transcript API. Handlers talk to
/// this trait only, so the real HTTP client and the test mock are interchangeable.
#[async_trait]
pub trait ApiService: Send + Sync {
    /// POST /upload_and_index (multipart `file`). The backend only indexes PDFs.
    async fn upload_and_index(&self, file_name: String, bytes: Vec<u8>) -> Result<Document, ApiError>;

    /// GET /documents?include_deleted={bool}
    async fn documents(&self, include_deleted: bool) -> Result<Vec<Document>, ApiError>;

    /// GET /documents/recent?limit={n}
    async fn recent_documents(&self, limit: u32) -> Result<Vec<Document>, ApiError>;

    /// POST /populate_chroma; returns the new collection id.
    async fn populate_chroma(&self, paths: Vec<String>) -> Result<String, ApiError>;

    /// POST /conv with the caller's phone number.
    async fn conversations_by_phone(&self, phone: &str) -> Result<Vec<Conversation>, ApiError>;

    /// GET /forms
    async fn forms(&self) -> Result<Vec<Form>, ApiError>;
}

/// ApiState
///
/// The concrete type used to share backend access across the application state.
pub type ApiState = Arc<dyn ApiService>;

// 2. The Real Implementation (reqwest)
/// BackendClient
///
/// JSON-over-HTTP client for the backend, rooted at the configured base URL.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(path: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(path, status, &body);
        tracing::warn!(status = status.as_u16(), %message, "backend request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// Builds the one-line message for a non-2xx backend answer.
///
/// FastAPI error bodies (`{"detail": ...}`) become `Request failed: {status} – {detail}`.
/// Any other non-empty body is shown verbatim. An empty body falls back to a
/// per-endpoint message carrying the status.
pub fn error_message(path: &str, status: StatusCode, body: &str) -> String {
    if let Ok(ErrorDetail { detail }) = serde_json::from_str::<ErrorDetail>(body) {
        let detail = match detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return format!("Request failed: {} – {}", status.as_u16(), detail);
    }
    let body = body.trim();
    if body.is_empty() {
        empty_body_message(path, status.as_u16())
    } else {
        body.lines().next().unwrap_or(body).to_string()
    }
}

fn empty_body_message(path: &str, status: u16) -> String {
    match path {
        "/conv" => format!("Failed to fetch conversations (status {status})"),
        _ => format!("Request failed: {status}"),
    }
}

#[async_trait]
impl ApiService for BackendClient {
    async fn upload_and_index(&self, file_name: String, bytes: Vec<u8>) -> Result<Document, ApiError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/upload_and_index"))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check("/upload_and_index", response).await?.json().await?)
    }

    async fn documents(&self, include_deleted: bool) -> Result<Vec<Document>, ApiError> {
        let response = self
            .http
            .get(self.url("/documents"))
            .query(&[("include_deleted", include_deleted)])
            .send()
            .await?;
        Ok(Self::check("/documents", response).await?.json().await?)
    }

    async fn recent_documents(&self, limit: u32) -> Result<Vec<Document>, ApiError> {
        let response = self
            .http
            .get(self.url("/documents/recent"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Ok(Self::check("/documents/recent", response).await?.json().await?)
    }

    async fn populate_chroma(&self, paths: Vec<String>) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.url("/populate_chroma"))
            .json(&PopulateRequest { paths })
            .send()
            .await?;
        let payload: TextPayload = Self::check("/populate_chroma", response).await?.json().await?;
        Ok(payload.text)
    }

    async fn conversations_by_phone(&self, phone: &str) -> Result<Vec<Conversation>, ApiError> {
        let response = self
            .http
            .post(self.url("/conv"))
            .json(&TextPayload {
                text: phone.to_string(),
            })
            .send()
            .await?;
        Ok(Self::check("/conv", response).await?.json().await?)
    }

    async fn forms(&self) -> Result<Vec<Form>, ApiError> {
        let response = self
            .http
            .get(self.url("/forms"))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Ok(Self::check("/forms", response).await?.json().await?)
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockApiService
///
/// Canned backend used by handler and router tests. Documents are filtered and
/// ordered the way the backend does it (newest first, deleted hidden by default).
#[derive(Clone, Default)]
pub struct MockApiService {
    pub documents: Vec<Document>,
    pub conversations: Vec<Conversation>,
    pub forms: Vec<Form>,
    /// When true, every call fails with a 500.
    pub should_fail: bool,
}

impl MockApiService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    fn fail_if_requested(&self) -> Result<(), ApiError> {
        if self.should_fail {
            return Err(ApiError::Status {
                status: 500,
                message: "Request failed: 500 – Mock API Error".to_string(),
            });
        }
        Ok(())
    }

    fn sorted_documents(&self, include_deleted: bool) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .filter(|d| include_deleted || !d.deleted)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        docs
    }
}

#[async_trait]
impl ApiService for MockApiService {
    async fn upload_and_index(&self, file_name: String, _bytes: Vec<u8>) -> Result<Document, ApiError> {
        self.fail_if_requested()?;
        if !file_name.to_lowercase().ends_with(".pdf") {
            return Err(ApiError::Status {
                status: 400,
                message: "Request failed: 400 – Only PDF files are supported.".to_string(),
            });
        }
        Ok(Document {
            id: self.documents.len() as i64 + 1,
            path: format!("tmp_databases/{file_name}"),
            name: file_name,
            collection: Some("docs_mock".to_string()),
            uploaded_at: chrono::Utc::now(),
            deleted: false,
        })
    }

    async fn documents(&self, include_deleted: bool) -> Result<Vec<Document>, ApiError> {
        self.fail_if_requested()?;
        Ok(self.sorted_documents(include_deleted))
    }

    async fn recent_documents(&self, limit: u32) -> Result<Vec<Document>, ApiError> {
        self.fail_if_requested()?;
        Ok(self
            .sorted_documents(false)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn populate_chroma(&self, _paths: Vec<String>) -> Result<String, ApiError> {
        self.fail_if_requested()?;
        Ok("docs_mock".to_string())
    }

    async fn conversations_by_phone(&self, phone: &str) -> Result<Vec<Conversation>, ApiError> {
        self.fail_if_requested()?;
        Ok(self
            .conversations
            .iter()
            .filter(|c| c.phone_number.as_deref() == Some(phone))
            .cloned()
            .collect())
    }

    async fn forms(&self) -> Result<Vec<Form>, ApiError> {
        self.fail_if_requested()?;
        Ok(self.forms.clone())
    }
}
