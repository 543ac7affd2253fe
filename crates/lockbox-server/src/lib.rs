//! `Lockbox` HTTP server.
//!
//! Exposes the core envelope and analysis operations as a stateless JSON API
//! at `/v1/*`. The master password arrives in the `X-Master-Password` header
//! on every crypto request and is dropped when the request ends.

pub mod config;
pub mod error;
pub mod hardening;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware as axum_mw;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{MASTER_PASSWORD_HEADER, master_password_middleware};
use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Every crypto route derives at least one key. The credential check runs
    // first so rejected requests never hold a permit.
    let crypto_routes = Router::new()
        .nest("/v1/envelope", routes::envelope::router())
        .nest("/v1/records", routes::records::router())
        .nest("/v1/security", routes::security::router())
        .layer(GlobalConcurrencyLimitLayer::new(
            state.max_concurrent_derivations,
        ))
        .route_layer(axum_mw::from_fn(master_password_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(MASTER_PASSWORD_HEADER),
        ]);

    Router::new()
        .nest("/v1/sys", routes::sys::router())
        .merge(crypto_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
