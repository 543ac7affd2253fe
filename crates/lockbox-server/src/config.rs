//! Server configuration for `Lockbox`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `LOCKBOX_*` environment variables.

use std::net::SocketAddr;

/// Default port when neither `LOCKBOX_BIND_ADDR` nor `PORT` is set.
const DEFAULT_PORT: u16 = 8300;

/// Default cap on key derivations running at once.
const DEFAULT_MAX_CONCURRENT_DERIVATIONS: usize = 8;

/// Default cap on records accepted by one analysis request.
const DEFAULT_MAX_ANALYZE_RECORDS: usize = 5_000;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Whether to skip `mlock` (for development without root/`CAP_IPC_LOCK`).
    pub disable_mlock: bool,
    /// Upper bound on in-flight requests to the crypto routes. Each one runs
    /// at least one 100k-round key derivation.
    pub max_concurrent_derivations: usize,
    /// Upper bound on `records` in one analysis request.
    pub max_analyze_records: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on, binds to `0.0.0.0`
    /// - `LOCKBOX_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8300`)
    /// - `LOCKBOX_LOG_LEVEL`: log filter (default: `info`)
    /// - `LOCKBOX_DISABLE_MLOCK`: skip `mlockall` for dev environments (default: `false`)
    /// - `LOCKBOX_MAX_CONCURRENT_DERIVATIONS`: crypto request limit (default: `8`)
    /// - `LOCKBOX_MAX_ANALYZE_RECORDS`: records per analysis (default: `5000`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));

        // Priority: LOCKBOX_BIND_ADDR > PORT > default 127.0.0.1:8300
        let bind_addr = if let Some(addr) = lookup("LOCKBOX_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = lookup("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(DEFAULT_PORT)))
        } else {
            default_addr
        };

        let log_level = lookup("LOCKBOX_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let disable_mlock = lookup("LOCKBOX_DISABLE_MLOCK")
            .is_some_and(|v| v == "true" || v == "1");

        let max_concurrent_derivations = lookup("LOCKBOX_MAX_CONCURRENT_DERIVATIONS")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_CONCURRENT_DERIVATIONS);

        let max_analyze_records = lookup("LOCKBOX_MAX_ANALYZE_RECORDS")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_ANALYZE_RECORDS);

        Self {
            bind_addr,
            log_level,
            disable_mlock,
            max_concurrent_derivations,
            max_analyze_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8300)));
        assert_eq!(config.log_level, "info");
        assert!(!config.disable_mlock);
        assert_eq!(config.max_concurrent_derivations, 8);
        assert_eq!(config.max_analyze_records, 5_000);
    }

    #[test]
    fn port_binds_all_interfaces() {
        let config = config_from(&[("PORT", "9000")]);
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
    }

    #[test]
    fn bind_addr_overrides_port() {
        let config = config_from(&[("PORT", "9000"), ("LOCKBOX_BIND_ADDR", "10.0.0.5:7000")]);
        assert_eq!(config.bind_addr, SocketAddr::from(([10, 0, 0, 5], 7000)));
    }

    #[test]
    fn unparseable_bind_addr_falls_back() {
        let config = config_from(&[("LOCKBOX_BIND_ADDR", "not-an-addr")]);
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8300)));
    }

    #[test]
    fn mlock_flag_accepts_true_and_one() {
        assert!(config_from(&[("LOCKBOX_DISABLE_MLOCK", "true")]).disable_mlock);
        assert!(config_from(&[("LOCKBOX_DISABLE_MLOCK", "1")]).disable_mlock);
        assert!(!config_from(&[("LOCKBOX_DISABLE_MLOCK", "yes")]).disable_mlock);
    }

    #[test]
    fn zero_limits_fall_back_to_defaults() {
        let config = config_from(&[
            ("LOCKBOX_MAX_CONCURRENT_DERIVATIONS", "0"),
            ("LOCKBOX_MAX_ANALYZE_RECORDS", "0"),
        ]);
        assert_eq!(config.max_concurrent_derivations, 8);
        assert_eq!(config.max_analyze_records, 5_000);
    }

    #[test]
    fn limits_are_configurable() {
        let config = config_from(&[
            ("LOCKBOX_MAX_CONCURRENT_DERIVATIONS", "2"),
            ("LOCKBOX_MAX_ANALYZE_RECORDS", "50"),
            ("LOCKBOX_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.max_concurrent_derivations, 2);
        assert_eq!(config.max_analyze_records, 50);
        assert_eq!(config.log_level, "debug");
    }
}
