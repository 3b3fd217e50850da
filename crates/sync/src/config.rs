//! Client configuration. Constructed explicitly and passed in; there is no
//! module-level client singleton.

use std::path::PathBuf;
use std::time::Duration;

/// Default polling interval for the change-feed fallback.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default timeout for establishing the push channel.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default per-request timeout for remote calls, so reads fail over to the
/// cache instead of loading indefinitely.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the sync client.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the API, e.g. `http://localhost:3000/api/v1`.
    pub base_url: String,
    /// WebSocket URL of the change feed, derived from `base_url` unless
    /// overridden.
    pub ws_url: String,
    /// Directory for the persistent local cache.
    pub cache_dir: PathBuf,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// Build a configuration with defaults for every tunable.
    pub fn new(base_url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let ws_url = derive_ws_url(&base_url);
        Self {
            base_url,
            ws_url,
            cache_dir: cache_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default                          |
    /// |---------------------|----------------------------------|
    /// | `REPATLAS_API_URL`  | `http://localhost:3000/api/v1`   |
    /// | `REPATLAS_CACHE_DIR`| `.repatlas-cache`                |
    pub fn from_env() -> Self {
        let base_url = std::env::var("REPATLAS_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/v1".into());
        let cache_dir =
            std::env::var("REPATLAS_CACHE_DIR").unwrap_or_else(|_| ".repatlas-cache".into());
        Self::new(base_url, cache_dir)
    }
}

/// Derive the change-feed WebSocket URL from the API base URL.
fn derive_ws_url(base_url: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{ws_base}/changes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_is_derived_from_base() {
        let config = SyncConfig::new("http://localhost:3000/api/v1/", "/tmp/c");
        assert_eq!(config.base_url, "http://localhost:3000/api/v1");
        assert_eq!(config.ws_url, "ws://localhost:3000/api/v1/changes");
    }

    #[test]
    fn https_becomes_wss() {
        let config = SyncConfig::new("https://api.example.com/api/v1", "/tmp/c");
        assert_eq!(config.ws_url, "wss://api.example.com/api/v1/changes");
    }
}
