use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    api::ApiError, models::MessageResponse, session::SessionError, validation::ValidationError,
};

/// Failures of a single portal action. None of them is fatal; each is scoped to
/// the request that triggered it.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        match self {
            PortalError::Validation(err) => (StatusCode::UNPROCESSABLE_ENTITY, Json(err)).into_response(),
            PortalError::Session(err) => message(StatusCode::BAD_REQUEST, err.to_string()),
            PortalError::MalformedPayload(_) => message(StatusCode::BAD_REQUEST, self.to_string()),
            PortalError::Api(err) => {
                // Backend client errors (bad file type, ...) keep their status; anything
                // else is a gateway failure.
                let status = match &err {
                    ApiError::Status { status, .. } if (400..500).contains(status) => {
                        StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                    }
                    _ => StatusCode::BAD_GATEWAY,
                };
                message(status, err.to_string())
            }
        }
    }
}

fn message(status: StatusCode, message: String) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}
