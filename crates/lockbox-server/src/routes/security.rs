//! Security routes: `/v1/security/*`
//!
//! Vault password analysis. The caller supplies the stored password records;
//! the result is computed per request and never cached.

use std::fmt;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;

use lockbox_core::{MasterPassword, VaultAnalysis, VaultRecord, analyze};

use super::{ApiJson, run_blocking};
use crate::error::AppError;
use crate::state::AppState;

/// Request bodies can hold thousands of envelopes.
const ANALYZE_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Build the `/v1/security` router.
///
/// Paths:
/// - `POST /v1/security/analyze`: `{records}` to a vault analysis
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze", post(analyze_vault))
        .layer(DefaultBodyLimit::max(ANALYZE_BODY_LIMIT))
}

/// Body for `POST /v1/security/analyze`.
#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub records: Vec<VaultRecord>,
}

impl fmt::Debug for AnalyzeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzeRequest")
            .field("records", &self.records.len())
            .finish()
    }
}

async fn analyze_vault(
    State(state): State<Arc<AppState>>,
    Extension(master): Extension<MasterPassword>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<VaultAnalysis>, AppError> {
    let supplied = request.records.len();
    if supplied > state.max_analyze_records {
        return Err(AppError::BadRequest(format!(
            "too many records: {supplied} exceeds the limit of {}",
            state.max_analyze_records
        )));
    }

    let records = request.records;
    let analysis = run_blocking(move || Ok(analyze(&records, &master, Utc::now()))).await?;

    if analysis.looks_like_wrong_password() {
        tracing::warn!(
            supplied,
            "no record decrypted; master password is probably wrong"
        );
    }

    Ok(Json(analysis))
}
