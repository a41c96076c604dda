//! Configuration types for the extraction backend and its HTTP client.
//!
//! Every backend knob lives in [`BackendConfig`], built via its
//! [`BackendConfigBuilder`] or read from the process environment with
//! [`BackendConfig::from_env`]. The config is handed to
//! [`crate::Backend::new`] explicitly; nothing in the library reads
//! environment variables behind the caller's back.

use crate::error::Doc2TxtError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tika's stock listen address.
pub const DEFAULT_TIKA_ENDPOINT: &str = "http://localhost:9998";

/// Where `doc2txt serve` listens unless told otherwise.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8005";

/// Where the client looks for a backend unless told otherwise.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8005";

/// Configuration for the extraction backend.
///
/// # Example
/// ```rust
/// use doc2txt::BackendConfig;
///
/// let config = BackendConfig::builder()
///     .tika_endpoint("http://tika:9998")
///     .tika_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.tika_endpoint, "http://tika:9998");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the running Tika server. Default: `http://localhost:9998`.
    pub tika_endpoint: String,

    /// Timeout for one extraction call to Tika, in seconds. Default: 60.
    ///
    /// When it elapses the request fails with
    /// [`Doc2TxtError::EngineTimeout`].
    pub tika_timeout_secs: u64,

    /// Timeout for the health ping, in seconds. Default: 5.
    ///
    /// Orchestrators probe `/health` every 30 s; the ping must answer well
    /// inside that window even when Tika hangs.
    pub health_timeout_secs: u64,

    /// Path to a local Tika artifact.
    ///
    /// Accepted for compatibility with existing deployments and logged at
    /// startup. No code path reads it.
    pub tika_path: Option<PathBuf>,

    /// Apply whitespace normalisation to engine output. Default: true.
    pub normalize_output: bool,

    /// Upper bound on a request body, in bytes. Default: 64 MiB.
    ///
    /// Base64 inflates payloads by a third, so this admits files of
    /// roughly 48 MiB.
    pub max_request_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            tika_endpoint: DEFAULT_TIKA_ENDPOINT.to_string(),
            tika_timeout_secs: 60,
            health_timeout_secs: 5,
            tika_path: None,
            normalize_output: true,
            max_request_bytes: 64 * 1024 * 1024,
        }
    }
}

impl BackendConfig {
    /// Create a new builder for `BackendConfig`.
    pub fn builder() -> BackendConfigBuilder {
        BackendConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read `TIKA_SERVER_ENDPOINT` and `TIKA_PATH` from the environment.
    pub fn from_env() -> Result<Self, Doc2TxtError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Doc2TxtError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(endpoint) = get("TIKA_SERVER_ENDPOINT") {
            builder = builder.tika_endpoint(endpoint);
        }
        if let Some(path) = get("TIKA_PATH") {
            builder = builder.tika_path(path);
        }
        if let Some(secs) = get("DOC2TXT_TIKA_TIMEOUT") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                Doc2TxtError::InvalidConfig(format!("DOC2TXT_TIKA_TIMEOUT '{secs}': {e}"))
            })?;
            builder = builder.tika_timeout_secs(secs);
        }
        builder.build()
    }
}

/// Builder for [`BackendConfig`].
#[derive(Debug)]
pub struct BackendConfigBuilder {
    config: BackendConfig,
}

impl BackendConfigBuilder {
    pub fn tika_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        self.config.tika_endpoint = endpoint.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn tika_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tika_timeout_secs = secs;
        self
    }

    pub fn health_timeout_secs(mut self, secs: u64) -> Self {
        self.config.health_timeout_secs = secs.clamp(1, 30);
        self
    }

    pub fn tika_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tika_path = Some(path.into());
        self
    }

    pub fn normalize_output(mut self, v: bool) -> Self {
        self.config.normalize_output = v;
        self
    }

    pub fn max_request_bytes(mut self, n: usize) -> Self {
        self.config.max_request_bytes = n.max(1024);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BackendConfig, Doc2TxtError> {
        let c = &self.config;
        validate_http_url("Tika endpoint", &c.tika_endpoint)?;
        if c.tika_timeout_secs == 0 {
            return Err(Doc2TxtError::InvalidConfig(
                "Tika timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for [`crate::client::BackendClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running doc2txt backend. Default: `http://localhost:8005`.
    pub backend_url: String,

    /// Whole-request timeout, in seconds. Default: 120.
    ///
    /// Longer than the backend's own Tika timeout so the backend gets to
    /// report the engine timeout instead of the client cutting it off.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl ClientConfig {
    /// A config pointing at `backend_url` with the default timeout.
    pub fn new(backend_url: impl Into<String>) -> Result<Self, Doc2TxtError> {
        let backend_url: String = backend_url.into();
        let backend_url = backend_url.trim().trim_end_matches('/').to_string();
        validate_http_url("backend URL", &backend_url)?;
        Ok(Self {
            backend_url,
            ..Self::default()
        })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }
}

fn validate_http_url(what: &str, raw: &str) -> Result<(), Doc2TxtError> {
    let url = Url::parse(raw)
        .map_err(|e| Doc2TxtError::InvalidConfig(format!("{what} '{raw}' is not a URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Doc2TxtError::InvalidConfig(format!(
            "{what} '{raw}' must use http or https, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_tika() {
        let c = BackendConfig::default();
        assert_eq!(c.tika_endpoint, "http://localhost:9998");
        assert_eq!(c.tika_timeout_secs, 60);
        assert!(c.normalize_output);
        assert!(c.tika_path.is_none());
    }

    #[test]
    fn builder_strips_trailing_slash() {
        let c = BackendConfig::builder()
            .tika_endpoint("http://tika:9998/")
            .build()
            .unwrap();
        assert_eq!(c.tika_endpoint, "http://tika:9998");
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = BackendConfig::builder()
            .tika_endpoint("ftp://tika:9998")
            .build()
            .unwrap_err();
        assert!(matches!(err, Doc2TxtError::InvalidConfig(_)));

        let err = BackendConfig::builder()
            .tika_endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a URL"), "got: {err}");
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(BackendConfig::builder().tika_timeout_secs(0).build().is_err());
    }

    #[test]
    fn builder_clamps_health_timeout() {
        let c = BackendConfig::builder()
            .health_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.health_timeout_secs, 1);
    }

    #[test]
    fn lookup_reads_endpoint_and_path() {
        let vars: HashMap<&str, &str> = [
            ("TIKA_SERVER_ENDPOINT", "http://tika:9998"),
            ("TIKA_PATH", "/opt/tika/tika-server.jar"),
            ("DOC2TXT_TIKA_TIMEOUT", "15"),
        ]
        .into_iter()
        .collect();
        let c = BackendConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.tika_endpoint, "http://tika:9998");
        assert_eq!(
            c.tika_path.as_deref(),
            Some(std::path::Path::new("/opt/tika/tika-server.jar"))
        );
        assert_eq!(c.tika_timeout_secs, 15);
    }

    #[test]
    fn lookup_treats_empty_as_unset() {
        let c = BackendConfig::from_lookup(|k| {
            (k == "TIKA_SERVER_ENDPOINT").then(|| "  ".to_string())
        })
        .unwrap();
        assert_eq!(c.tika_endpoint, DEFAULT_TIKA_ENDPOINT);
    }

    #[test]
    fn lookup_rejects_bad_timeout() {
        let err = BackendConfig::from_lookup(|k| {
            (k == "DOC2TXT_TIKA_TIMEOUT").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("DOC2TXT_TIKA_TIMEOUT"));
    }

    #[test]
    fn client_config_validates_url() {
        let c = ClientConfig::new("http://backend:8005/").unwrap();
        assert_eq!(c.backend_url, "http://backend:8005");
        assert!(ClientConfig::new("backend:8005").is_err());
    }
}
