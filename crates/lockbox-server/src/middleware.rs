//! Credential middleware for `Lockbox`.
//!
//! Extracts the `X-Master-Password` header and injects it into the request
//! extensions as a [`MasterPassword`] for downstream handlers. The header is
//! removed from the request so nothing further down can log it.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use lockbox_core::MasterPassword;

use crate::error::AppError;

/// Header carrying the master password on every crypto request.
pub const MASTER_PASSWORD_HEADER: &str = "x-master-password";

/// Middleware that requires a non-empty `X-Master-Password` header.
///
/// The value is taken as raw UTF-8, without trimming.
pub async fn master_password_middleware(mut req: Request, next: Next) -> Response {
    let supplied = req
        .headers_mut()
        .remove(MASTER_PASSWORD_HEADER)
        .and_then(|v| String::from_utf8(v.as_bytes().to_vec()).ok());

    let Some(master) = supplied.and_then(|s| MasterPassword::new(s).ok()) else {
        return AppError::MissingCredential.into_response();
    };

    req.extensions_mut().insert(master);
    next.run(req).await
}
