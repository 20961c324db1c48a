use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    guard::{Location, Redirect},
    session::Role,
    shell::{Chrome, View},
};

// --- Backend Records (Consumed from the document/transcript API) ---

/// Document
///
/// An uploaded, indexed PDF as listed by `GET /documents`. `collection` and
/// `deleted` are only present on some backend responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[ts(type = "string")]
    pub uploaded_at: DateTime<Utc>,
    // The backend stores this as an integer flag (0/1).
    #[serde(default, with = "int_flag")]
    #[ts(type = "boolean")]
    pub deleted: bool,
}

mod int_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum MessageRole {
    User,
    Bot,
}

/// Message
///
/// One chatbot turn. Bot answers grounded in a document carry the source path
/// (`path_df`) and page number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub text: String,
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub path_df: Option<String>,
    #[serde(default)]
    pub number_page: Option<i32>,
}

/// Conversation
///
/// A chatbot transcript looked up by caller phone number (`POST /conv`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Conversation {
    pub id: Uuid,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[ts(type = "string | null")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FormConversation {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Form
///
/// A questionnaire generated from a conversation (`GET /forms`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Form {
    pub id: String,
    // Left as the backend's string; the UI formats it when it parses.
    pub created_at: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub conversation: FormConversation,
    #[serde(default)]
    pub questions: Vec<String>,
}

// --- Backend Request Payloads ---

/// The backend's single-string envelope, used by `/conv` and `/populate_chroma`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TextPayload {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PopulateRequest {
    pub paths: Vec<String>,
}

// --- Portal Request Payloads (Input Schemas) ---

/// LoginSessionRequest
///
/// Adopts a credential already validated by the identity provider (POST /api/session).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginSessionRequest {
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// LoginRequest
///
/// The login screen submission. The credential pair is validated inline; the token
/// and role come from the identity provider's answer. `from` is the redirect state
/// handed to the login screen by the Route Guard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub token: String,
    pub role: Role,
    #[serde(default)]
    pub from: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
#[ts(export)]
pub enum AccountDetails {
    Client {
        username: String,
        first_name: String,
        last_name: String,
    },
    Company {
        company_name: String,
        registration_no: String,
        contact_person: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub account: AccountDetails,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ForgotRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TranscriptSearchRequest {
    pub phone: String,
}

// --- Portal Responses (Output Schemas) ---

/// The session as exposed over HTTP. The token itself never leaves the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub authenticated: bool,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub session: SessionView,
    pub redirect_to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// Data attached to a rendered view, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
#[ts(export)]
pub enum ViewData {
    Documents(Vec<Document>),
    Conversations(Vec<Conversation>),
    Forms(Vec<Form>),
}

/// ViewResponse
///
/// A rendered navigation. `error` is the one-line message shown next to the view's
/// triggering control when its data could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ViewResponse {
    pub view: View,
    pub location: Location,
    pub chrome: Chrome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ViewData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RedirectResponse {
    pub redirect: Redirect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_accepts_integer_deleted_flag() {
        let doc: Document = serde_json::from_str(
            r#"{"id":7,"name":"policy.pdf","path":"tmp/policy.pdf","collection":"docs_1",
                "uploaded_at":"2025-03-01T10:00:00Z","deleted":1}"#,
        )
        .unwrap();
        assert!(doc.deleted);
        assert_eq!(doc.collection.as_deref(), Some("docs_1"));
    }

    #[test]
    fn document_without_optional_fields() {
        let doc: Document = serde_json::from_str(
            r#"{"id":1,"name":"a.pdf","path":"a.pdf","uploaded_at":"2025-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(!doc.deleted);
        assert!(doc.collection.is_none());
    }

    #[test]
    fn form_without_conversation_defaults() {
        let form: Form = serde_json::from_str(
            r#"{"id":"0123456789abcdef","created_at":"2025-01-01","locale":"ro","questions":["q1"]}"#,
        )
        .unwrap();
        assert!(form.conversation.label.is_none());
        assert!(form.conversation.phone_number.is_none());
        assert_eq!(form.questions, vec!["q1".to_string()]);
    }

    #[test]
    fn view_data_is_tagged() {
        let json = serde_json::to_value(ViewData::Forms(vec![])).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "forms", "items": []}));
    }
}
