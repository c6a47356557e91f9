//! Target configuration for the system under test.
//!
//! Defaults point at a locally running marketplace. Override via environment
//! variables or explicit construction for staging/testing.

use url::Url;

/// Default marketplace application URL.
pub const DEFAULT_TARGET_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout, applied by the transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for connecting to the marketplace under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Base URL of the marketplace application.
    /// Default: <http://127.0.0.1:8000>
    pub app_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent on every request.
    pub user_agent: String,
}

impl TargetConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `MARKETBENCH_TARGET_URL` (default: `http://127.0.0.1:8000`)
    /// - `MARKETBENCH_TIMEOUT_SECS` (default: 10)
    /// - `MARKETBENCH_USER_AGENT` (default: `marketbench/<version>`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_url: env_url("MARKETBENCH_TARGET_URL", DEFAULT_TARGET_URL)?,
            timeout_secs: std::env::var("MARKETBENCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            user_agent: std::env::var("MARKETBENCH_USER_AGENT")
                .unwrap_or_else(|_| default_user_agent()),
        })
    }

    /// Point this configuration at `raw`, keeping its timeout and agent.
    pub fn with_target(self, raw: &str) -> Result<Self, ConfigError> {
        let app_url = Url::parse(raw)
            .map_err(|e| ConfigError::InvalidUrl("target".to_string(), e.to_string()))?;
        Ok(Self { app_url, ..self })
    }

    /// Configuration pointing at a local server on `port` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local(port: u16) -> Result<Self, ConfigError> {
        let app_url = Url::parse(&format!("http://127.0.0.1:{port}"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            app_url,
            timeout_secs: 5,
            user_agent: default_user_agent(),
        })
    }
}

fn default_user_agent() -> String {
    format!("marketbench/{}", env!("CARGO_PKG_VERSION"))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_builds_valid_config() {
        let cfg = TargetConfig::local(9000).unwrap();
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.app_url.as_str(), "http://127.0.0.1:9000/");
        assert!(cfg.user_agent.starts_with("marketbench/"));
    }

    #[test]
    fn with_target_rejects_garbage() {
        let base = TargetConfig::local(9000).unwrap();
        assert!(base.with_target("not a url").is_err());
    }

    #[test]
    fn with_target_replaces_only_the_url() {
        let base = TargetConfig {
            timeout_secs: 45,
            user_agent: "bench-agent/1".into(),
            ..TargetConfig::local(9000).unwrap()
        };
        let cfg = base.with_target("https://market.example.com").unwrap();
        assert_eq!(cfg.app_url.as_str(), "https://market.example.com/");
        assert_eq!(cfg.timeout_secs, 45);
        assert_eq!(cfg.user_agent, "bench-agent/1");
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("NONEXISTENT_VAR_MARKETBENCH_1", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("TEST_BAD_URL_MARKETBENCH", "not a url");
        let result = env_url("TEST_BAD_URL_MARKETBENCH", "https://example.com");
        std::env::remove_var("TEST_BAD_URL_MARKETBENCH");
        assert!(result.is_err());
    }
}
