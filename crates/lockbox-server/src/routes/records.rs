//! Record routes: `/v1/records/*`
//!
//! Seal a typed record payload into one envelope, or open an envelope as a
//! given record kind. Field groups (payment, personal info) travel as a
//! single JSON document inside one envelope.

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::post;
use axum::{Extension, Json, Router};

use lockbox_core::{EncodedEnvelope, MasterPassword, RecordKind, RecordPayload};

use super::{ApiJson, run_blocking};
use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/records` router.
///
/// Paths:
/// - `POST /v1/records/seal`: `{kind, data}` to a new envelope
/// - `POST /v1/records/open/{kind}`: envelope to `{kind, data}`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seal", post(seal))
        .route("/open/{kind}", post(open))
}

async fn seal(
    Extension(master): Extension<MasterPassword>,
    ApiJson(payload): ApiJson<RecordPayload>,
) -> Result<Json<EncodedEnvelope>, AppError> {
    if payload.is_empty_group() {
        return Err(AppError::BadRequest(format!(
            "{} record has no fields set",
            payload.kind()
        )));
    }

    let kind = payload.kind();
    let envelope = run_blocking(move || payload.seal(&master)).await?;
    tracing::debug!(kind = %kind, "record sealed");
    Ok(Json(envelope.encode()))
}

async fn open(
    Extension(master): Extension<MasterPassword>,
    Path(kind): Path<String>,
    ApiJson(encoded): ApiJson<EncodedEnvelope>,
) -> Result<Json<RecordPayload>, AppError> {
    let kind: RecordKind = kind.parse().map_err(AppError::BadRequest)?;
    let envelope = encoded.decode()?;
    let payload = run_blocking(move || RecordPayload::open(kind, &envelope, &master)).await?;
    Ok(Json(payload))
}
