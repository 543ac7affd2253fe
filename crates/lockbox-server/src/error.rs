//! HTTP error types for `Lockbox` server.
//!
//! Maps domain errors from `lockbox-core` into appropriate HTTP responses.
//! Every error variant produces a JSON body with a machine-readable `error`
//! field and a human-readable `message`. No variant ever carries the master
//! password or decrypted data.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use lockbox_core::EnvelopeError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// The `X-Master-Password` header is absent or empty.
    MissingCredential,
    /// A stored envelope is missing a field or has a bad field.
    MalformedEnvelope(String),
    /// Tag verification failed. Wrong password and corruption look alike.
    DecryptionFailed,
    /// Client sent invalid input.
    BadRequest(String),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::MissingCredential => (
                StatusCode::BAD_REQUEST,
                "missing_credential",
                "X-Master-Password header is required".to_owned(),
            ),
            Self::MalformedEnvelope(msg) => (StatusCode::BAD_REQUEST, "malformed_envelope", msg),
            Self::DecryptionFailed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "decryption_failed",
                "could not decrypt: wrong master password or corrupted data".to_owned(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<EnvelopeError> for AppError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::MissingCredential => Self::MissingCredential,
            EnvelopeError::AuthenticationFailure => Self::DecryptionFailed,
            EnvelopeError::MalformedEnvelope { .. } => Self::MalformedEnvelope(err.to_string()),
            EnvelopeError::Encryption { .. } | EnvelopeError::Serialization { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
