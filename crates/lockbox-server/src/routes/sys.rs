//! System routes: `/v1/sys/*`
//!
//! Liveness plus the fixed envelope parameters, so clients can check they
//! speak the same wire format before sending anything.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use lockbox_core::crypto::{IV_LEN, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN, TAG_LEN};

use crate::state::AppState;

/// Build the `/v1/sys` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Response body for `GET /v1/sys/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub envelope: EnvelopeParams,
}

/// Wire-format constants every stored envelope depends on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeParams {
    pub cipher: &'static str,
    pub kdf: &'static str,
    pub kdf_iterations: u32,
    pub key_len: usize,
    pub salt_len: usize,
    pub iv_len: usize,
    pub tag_len: usize,
}

impl EnvelopeParams {
    #[must_use]
    pub fn current() -> Self {
        Self {
            cipher: "aes-256-gcm",
            kdf: "pbkdf2-hmac-sha512",
            kdf_iterations: PBKDF2_ITERATIONS,
            key_len: KEY_LEN,
            salt_len: SALT_LEN,
            iv_len: IV_LEN,
            tag_len: TAG_LEN,
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        envelope: EnvelopeParams::current(),
    })
}
