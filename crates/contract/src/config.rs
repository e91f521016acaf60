//! Harness configuration.
//!
//! The harness can be configured programmatically, from command line
//! arguments, or from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HYPERIOT_BASE_URL` | http://localhost:8181/hyperiot | Service base URL |
//! | `HYPERIOT_ADMIN_USERNAME` | hadmin | Administrative identity |
//! | `HYPERIOT_ADMIN_PASSWORD` | admin | Administrative password |
//! | `HYPERIOT_REQUEST_TIMEOUT` | 30 | Per-request timeout (seconds) |
//! | `HYPERIOT_LOG_LEVEL` | info | Log level |
//! | `HYPERIOT_DEFAULT_DELTA` | 10 | Page size used by paginated checks |
//! | `HYPERIOT_DEFAULT_PAGE` | 1 | Page number used by paginated checks |
//! | `HYPERIOT_DATABASE_URL` | - | PostgreSQL URL used for table truncation |
//!
//! # Example
//!
//! ```rust
//! use hyperiot_contract::ContractConfig;
//!
//! let config = ContractConfig {
//!     base_url: "http://127.0.0.1:8181/hyperiot".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use clap::Parser;

/// Configuration for a contract run.
#[derive(Debug, Clone, Parser)]
#[command(name = "hyperiot-verify")]
#[command(about = "Verifies HyperIoT REST response shapes")]
pub struct ContractConfig {
    /// Base URL of the service under test (without trailing slash).
    #[arg(
        long,
        env = "HYPERIOT_BASE_URL",
        default_value = "http://localhost:8181/hyperiot"
    )]
    pub base_url: String,

    /// Username of the administrative identity.
    #[arg(long, env = "HYPERIOT_ADMIN_USERNAME", default_value = "hadmin")]
    pub admin_username: String,

    /// Password of the administrative identity.
    #[arg(long, env = "HYPERIOT_ADMIN_PASSWORD", default_value = "admin")]
    pub admin_password: String,

    /// Request timeout in seconds.
    #[arg(long, env = "HYPERIOT_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "HYPERIOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Page size used by paginated list checks.
    #[arg(long, env = "HYPERIOT_DEFAULT_DELTA", default_value = "10")]
    pub default_delta: u32,

    /// Page number used by paginated list checks.
    #[arg(long, env = "HYPERIOT_DEFAULT_PAGE", default_value = "1")]
    pub default_page: u32,

    /// PostgreSQL connection string used to truncate tables after each case.
    #[arg(long, env = "HYPERIOT_DATABASE_URL")]
    pub database_url: Option<String>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8181/hyperiot".to_string(),
            admin_username: "hadmin".to_string(),
            admin_password: "admin".to_string(),
            request_timeout: 30,
            log_level: "info".to_string(),
            default_delta: 10,
            default_page: 1,
            database_url: None,
        }
    }
}

impl ContractConfig {
    /// Creates a configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["hyperiot-verify"]).unwrap_or_default()
    }

    /// Returns the request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if url::Url::parse(&self.base_url).is_err() {
            errors.push(format!("Base URL is not a valid URL: {}", self.base_url));
        }

        if self.admin_username.is_empty() {
            errors.push("Admin username cannot be empty".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_delta == 0 {
            errors.push("Default delta cannot be 0".to_string());
        }

        if self.default_page == 0 {
            errors.push("Default page cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration pointed at a locally bound test service.
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: 5,
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ContractConfig::default();
        assert_eq!(config.admin_username, "hadmin");
        assert_eq!(config.admin_password, "admin");
        assert_eq!(config.default_delta, 10);
        assert_eq!(config.default_page, 1);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_validate_valid() {
        assert!(ContractConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_url() {
        let config = ContractConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Base URL")));
    }

    #[test]
    fn test_validate_zero_values() {
        let config = ContractConfig {
            request_timeout: 0,
            default_delta: 0,
            default_page: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 3);
    }

    #[test]
    fn test_for_testing() {
        let config = ContractConfig::for_testing("http://127.0.0.1:4000");
        assert_eq!(config.base_url, "http://127.0.0.1:4000");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }
}
