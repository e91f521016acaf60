//! Error types for the contract harness.
//!
//! The variants follow the harness's failure taxonomy:
//!
//! | Variant | Meaning | Effect on the test case |
//! |---------|---------|-------------------------|
//! | `Assertion` | status, property set or criterion mismatch | case fails with actual vs. expected |
//! | `Transport` | connection refused, timeout | case fails |
//! | `Setup` | a fixture could not create its entity | dependent case aborts |
//! | `Authentication` | the admin login was rejected | case aborts |
//! | `InvalidRequest` | a request could not be built | case fails |
//! | `Json` | a body could not be decoded | case fails |
//! | `Cleanup` | truncation after the case failed | reported against the case |
//!
//! Nothing here is retried.

use thiserror::Error;

use crate::validator::Mismatch;

/// Result alias used throughout the harness.
pub type ContractResult<T> = Result<T, ContractError>;

/// The primary error type of the harness.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The response did not satisfy the declared expectations.
    #[error("assertion failed ({context}): {}", summarize(.mismatches))]
    Assertion {
        /// What was being validated (usually `METHOD uri`).
        context: String,
        /// Every mismatch found, with actual and expected shapes.
        mismatches: Vec<Mismatch>,
    },

    /// The HTTP exchange itself failed.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A fixture could not create its prerequisite entity.
    #[error("setup failed in {fixture}: {message}")]
    Setup {
        /// The fixture that failed (e.g. `create_project`).
        fixture: String,
        /// Description of the failure.
        message: String,
    },

    /// The administrative login was rejected or returned no token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A request description could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A JSON body could not be encoded or decoded.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Truncating a table after a case failed.
    #[error("cleanup failed for table {table}: {message}")]
    Cleanup {
        /// The table being truncated.
        table: String,
        /// Description of the failure.
        message: String,
    },
}

impl ContractError {
    /// Creates a setup error for the given fixture.
    pub fn setup(fixture: &str, message: impl Into<String>) -> Self {
        ContractError::Setup {
            fixture: fixture.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the error aborted a case before its request was issued.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            ContractError::Setup { .. } | ContractError::Authentication(_)
        )
    }
}

fn summarize(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_display_lists_mismatches() {
        let err = ContractError::Assertion {
            context: "GET /hprojects/1".to_string(),
            mismatches: vec![Mismatch::Status {
                expected: 200,
                actual: 404,
            }],
        };
        let message = err.to_string();
        assert!(message.contains("GET /hprojects/1"));
        assert!(message.contains("404"));
    }

    #[test]
    fn test_setup_helper() {
        let err = ContractError::setup("create_project", "status 500");
        assert!(err.is_setup());
        assert_eq!(
            err.to_string(),
            "setup failed in create_project: status 500"
        );
    }

    #[test]
    fn test_cleanup_is_not_setup() {
        let err = ContractError::Cleanup {
            table: "hproject".to_string(),
            message: "connection reset".to_string(),
        };
        assert!(!err.is_setup());
    }
}
