//! Stub service configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STUB_SERVER_PORT` | 8181 | Server port |
//! | `STUB_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `STUB_BASE_PATH` | /hyperiot | Path prefix of every API route |
//! | `STUB_ADMIN_USERNAME` | hadmin | Seeded administrator |
//! | `STUB_ADMIN_PASSWORD` | admin | Seeded administrator password |
//! | `STUB_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `STUB_LOG_LEVEL` | info | Log level |

use clap::Parser;

/// Configuration of the in-memory service.
#[derive(Debug, Clone, Parser)]
#[command(name = "hyperiot-stub")]
#[command(about = "In-memory HyperIoT REST service")]
pub struct StubConfig {
    /// Port to listen on.
    #[arg(long = "stub-port", env = "STUB_SERVER_PORT", default_value = "8181")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long = "stub-host", env = "STUB_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Path prefix under which the API is mounted.
    #[arg(long = "stub-base-path", env = "STUB_BASE_PATH", default_value = "/hyperiot")]
    pub base_path: String,

    /// Username of the seeded administrator.
    #[arg(long = "stub-admin-username", env = "STUB_ADMIN_USERNAME", default_value = "hadmin")]
    pub admin_username: String,

    /// Password of the seeded administrator.
    #[arg(long = "stub-admin-password", env = "STUB_ADMIN_PASSWORD", default_value = "admin")]
    pub admin_password: String,

    /// Request timeout in seconds.
    #[arg(long = "stub-request-timeout", env = "STUB_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long = "stub-log-level", env = "STUB_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            port: 8181,
            host: "127.0.0.1".to_string(),
            base_path: "/hyperiot".to_string(),
            admin_username: "hadmin".to_string(),
            admin_password: "admin".to_string(),
            request_timeout: 30,
            log_level: "info".to_string(),
        }
    }
}

impl StubConfig {
    /// Creates a configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["hyperiot-stub"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the base path without a trailing slash; empty when the API is
    /// mounted at the root.
    pub fn normalized_base_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            errors.push("Base path must start with '/'".to_string());
        }

        if self.admin_username.is_empty() {
            errors.push("Admin username cannot be empty".to_string());
        }

        if self.admin_password.is_empty() {
            errors.push("Admin password cannot be empty".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration for tests: ephemeral port, short timeout.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
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
        let config = StubConfig::default();
        assert_eq!(config.socket_addr(), "127.0.0.1:8181");
        assert_eq!(config.normalized_base_path(), "/hyperiot");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_root_base_path() {
        let config = StubConfig {
            base_path: "/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.normalized_base_path(), "");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_errors() {
        let config = StubConfig {
            base_path: "hyperiot".to_string(),
            admin_password: String::new(),
            request_timeout: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 3);
    }

    #[test]
    fn test_for_testing() {
        let config = StubConfig::for_testing();
        assert_eq!(config.port, 0);
        assert_eq!(config.request_timeout, 5);
    }
}
