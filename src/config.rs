//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Upstream Configuration
//!
//! - `IWINV_API_BASE_URL`: Base URL of the iwinv REST API (default: `https://api-kr.iwinv.kr`)
//! - `IWINV_REQUEST_TIMEOUT_SECS`: Timeout for individual upstream calls (default: 30)
//!
//! # Rate Limiting
//!
//! Two independent limits exist: the upstream window limit mirrors the quota
//! the iwinv API enforces per access key, and the inbound per-IP limit
//! protects this service itself.

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Upstream API Configuration
    // =========================================================================
    /// Base URL of the iwinv REST API, without a trailing slash
    /// Default: "https://api-kr.iwinv.kr"
    pub api_base_url: String,

    /// Timeout for individual upstream requests (default: 30 seconds)
    /// Prevents calls from hanging indefinitely on network issues
    pub request_timeout: Duration,

    // =========================================================================
    // Upstream Quota Configuration
    // =========================================================================
    /// Requests allowed per access key within one window (default: 60)
    pub window_max_requests: u32,

    /// Length of the per-key quota window (default: 60 seconds)
    pub window_length: Duration,

    /// How long an access key may stay idle before its quota window is
    /// evicted (default: 600 seconds)
    pub limiter_idle_timeout: Duration,

    /// Interval between eviction sweeps of idle quota windows (default: 60 seconds)
    pub limiter_sweep_interval: Duration,

    // =========================================================================
    // Inbound Rate Limiting Configuration
    // =========================================================================
    /// Requests per second limit per client (default: 100)
    /// Set to 0 to disable rate limiting
    pub rate_limit_rps: u32,

    /// Burst capacity - allows temporary spikes above rps limit (default: 50)
    pub rate_limit_burst: u32,

    // =========================================================================
    // Request Limits Configuration
    // =========================================================================
    /// Maximum request body size in bytes (default: 1MB)
    /// Prevents denial-of-service via large payloads
    pub max_request_body_size: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    /// Example: `<https://console.example.com>,<https://admin.example.com>`
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Emit per-request upstream call logs (method, path, status).
    /// Never enables logging of credentials; the secret key is never logged.
    pub debug_upstream_logging: bool,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any required configuration is invalid
    /// (e.g., non-numeric PORT value, malformed base URL).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Upstream API
            api_base_url: env::var("IWINV_API_BASE_URL")
                .unwrap_or_else(|_| "https://api-kr.iwinv.kr".to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(Self::parse_env(
                "IWINV_REQUEST_TIMEOUT_SECS",
                30,
            )?),

            // Upstream quota
            window_max_requests: Self::parse_env("IWINV_WINDOW_MAX_REQUESTS", 60)?,
            window_length: Duration::from_secs(Self::parse_env("IWINV_WINDOW_SECS", 60)?),
            limiter_idle_timeout: Duration::from_secs(Self::parse_env(
                "LIMITER_IDLE_TIMEOUT_SECS",
                600,
            )?),
            limiter_sweep_interval: Duration::from_secs(Self::parse_env(
                "LIMITER_SWEEP_INTERVAL_SECS",
                60,
            )?),

            // Inbound rate limiting
            rate_limit_rps: Self::parse_env("RATE_LIMIT_RPS", 100)?,
            rate_limit_burst: Self::parse_env("RATE_LIMIT_BURST", 50)?,

            // Request limits
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?, // 1MB

            // Security
            cors_allowed_origins: Self::parse_cors_origins(),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            debug_upstream_logging: Self::parse_env("IWINV_DEBUG_LOGGING", false)?,
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        // The signature covers only the path, so the base URL must carry
        // scheme and host and nothing after them
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(AppError::ConfigError(format!(
                "IWINV_API_BASE_URL must start with http:// or https:// (got {:?})",
                self.api_base_url
            )));
        }

        if self.window_max_requests == 0 {
            return Err(AppError::ConfigError(
                "IWINV_WINDOW_MAX_REQUESTS must be greater than 0".to_string(),
            ));
        }

        if self.window_length.is_zero() {
            return Err(AppError::ConfigError(
                "IWINV_WINDOW_SECS must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "IWINV_REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        // Validate max request body size is reasonable
        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if inbound rate limiting is enabled.
    pub fn rate_limiting_enabled(&self) -> bool {
        self.rate_limit_rps > 0
    }

    /// Check if the background eviction sweep is enabled.
    pub fn eviction_enabled(&self) -> bool {
        !self.limiter_sweep_interval.is_zero() && !self.limiter_idle_timeout.is_zero()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Upstream API
            api_base_url: "https://api-kr.iwinv.kr".to_string(),
            request_timeout: Duration::from_secs(30),
            // Upstream quota
            window_max_requests: 60,
            window_length: Duration::from_secs(60),
            limiter_idle_timeout: Duration::from_secs(600),
            limiter_sweep_interval: Duration::from_secs(60),
            // Inbound rate limiting
            rate_limit_rps: 100,
            rate_limit_burst: 50,
            // Request limits
            max_request_body_size: 1024 * 1024, // 1MB
            // Security
            cors_allowed_origins: vec!["*".to_string()],
            // Observability
            log_level: "info".to_string(),
            debug_upstream_logging: false,
            metrics_port: 9090,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.api_base_url, "https://api-kr.iwinv.kr");
        assert_eq!(config.window_max_requests, 60);
        assert_eq!(config.window_length, Duration::from_secs(60));
        assert_eq!(config.max_request_body_size, 1024 * 1024);
        assert!(!config.debug_upstream_logging);
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "localhost".to_string(),
            port: 3000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "localhost:3000");
    }

    #[test]
    fn test_server_addr_format_with_ip() {
        let config = Config {
            host: "192.168.1.1".to_string(),
            port: 8080,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "192.168.1.1:8080");
    }

    #[test]
    fn test_rate_limiting_enabled() {
        let config = Config::default();
        assert!(config.rate_limiting_enabled());

        let config = Config {
            rate_limit_rps: 0,
            ..Config::default()
        };
        assert!(!config.rate_limiting_enabled());
    }

    #[test]
    fn test_eviction_enabled() {
        let config = Config::default();
        assert!(config.eviction_enabled());

        let config = Config {
            limiter_sweep_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(!config.eviction_enabled());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = Config {
            api_base_url: "api-kr.iwinv.kr".to_string(),
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("IWINV_API_BASE_URL")
        );
    }

    #[test]
    fn test_validate_window_max_requests_zero() {
        let config = Config {
            window_max_requests: 0,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("IWINV_WINDOW_MAX_REQUESTS")
        );
    }

    #[test]
    fn test_validate_window_length_zero() {
        let config = Config {
            window_length: Duration::ZERO,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("IWINV_WINDOW_SECS"));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
