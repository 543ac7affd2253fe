//! Envelope routes: `/v1/envelope/*`
//!
//! Encrypt and decrypt one text value under the request's master password.

use std::fmt;
use std::sync::Arc;

use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use lockbox_core::{EncodedEnvelope, Envelope, MasterPassword};

use super::{ApiJson, run_blocking};
use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/envelope` router.
///
/// Paths:
/// - `POST /v1/envelope/encrypt`: `{plaintext}` to a new envelope
/// - `POST /v1/envelope/decrypt`: envelope to `{plaintext}`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/encrypt", post(encrypt))
        .route("/decrypt", post(decrypt))
}

// ── Request / Response types ─────────────────────────────────────────

/// Body for `POST /v1/envelope/encrypt` and response of `decrypt`.
#[derive(Deserialize, Serialize)]
pub struct PlaintextBody {
    pub plaintext: String,
}

impl fmt::Debug for PlaintextBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextBody").finish_non_exhaustive()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn encrypt(
    Extension(master): Extension<MasterPassword>,
    ApiJson(body): ApiJson<PlaintextBody>,
) -> Result<Json<EncodedEnvelope>, AppError> {
    let envelope = run_blocking(move || {
        let mut plaintext = body.plaintext;
        let sealed = Envelope::encrypt(plaintext.as_bytes(), &master);
        plaintext.zeroize();
        sealed
    })
    .await?;

    Ok(Json(envelope.encode()))
}

async fn decrypt(
    Extension(master): Extension<MasterPassword>,
    ApiJson(encoded): ApiJson<EncodedEnvelope>,
) -> Result<Json<PlaintextBody>, AppError> {
    let envelope = encoded.decode()?;
    let plaintext = run_blocking(move || envelope.decrypt_to_string(&master)).await?;
    Ok(Json(PlaintextBody { plaintext }))
}
