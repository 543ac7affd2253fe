//! HTTP route handlers for `Lockbox`.
//!
//! Routes are organized by subsystem:
//! - `sys`: health and fixed crypto parameters (no credential)
//! - `envelope`: encrypt and decrypt a single text value
//! - `records`: seal and open typed record payloads
//! - `security`: vault password analysis

pub mod envelope;
pub mod records;
pub mod security;
pub mod sys;

use axum::extract::FromRequest;

use lockbox_core::EnvelopeError;

use crate::error::AppError;

/// `Json` extractor whose rejections render as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Run a key-derivation-bound closure on the blocking pool.
///
/// Every path that derives a key goes through here so the async workers stay
/// free while PBKDF2 runs.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, EnvelopeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("crypto task failed: {e}")))?
        .map_err(AppError::from)
}
