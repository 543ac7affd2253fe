//! Shared application state for `Lockbox` server.
//!
//! The server keeps no vault data and no credentials between requests. The
//! state only carries the request limits read from [`ServerConfig`].

use crate::config::ServerConfig;

/// Shared application state passed to all HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Upper bound on in-flight requests to the crypto routes.
    pub max_concurrent_derivations: usize,
    /// Upper bound on `records` in one analysis request.
    pub max_analyze_records: usize,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            max_concurrent_derivations: config.max_concurrent_derivations,
            max_analyze_records: config.max_analyze_records,
        }
    }
}
