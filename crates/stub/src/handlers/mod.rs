//! HTTP handlers for the stub service.
//!
//! Handlers take the store lock, apply the change, render the response view
//! and release the lock before returning; nothing is awaited while the lock
//! is held.

pub mod areas;
pub mod auth;
pub mod hdevices;
pub mod health;
pub mod hpackets;
pub mod hprojects;
pub mod husers;

use serde::Deserialize;

use crate::error::{StubError, StubResult};

/// A reference to another entity inside a submitted body.
///
/// Only the id is read; any other property of the embedded entity is
/// ignored.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct IdRef {
    pub id: i64,
}

/// Returns the id of a required reference.
pub(crate) fn require_ref(field: &str, reference: Option<IdRef>) -> StubResult<i64> {
    reference
        .map(|r| r.id)
        .filter(|id| *id > 0)
        .ok_or_else(|| StubError::validation(field, "must reference an existing entity"))
}

/// Returns the trimmed value of a required text property.
pub(crate) fn require_text(field: &str, value: &str) -> StubResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StubError::validation(field, "must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Returns `value`, or `default` when absent, if it is one of `allowed`.
pub(crate) fn one_of(
    field: &str,
    value: Option<String>,
    default: &str,
    allowed: &[&str],
) -> StubResult<String> {
    let value = value.unwrap_or_else(|| default.to_string());
    if allowed.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(StubError::validation(
            field,
            format!("must be one of {}", allowed.join(", ")),
        ))
    }
}

/// Checks that a password was given twice identically.
pub(crate) fn require_password(password: &str, confirm: &str) -> StubResult<String> {
    if password.is_empty() {
        return Err(StubError::validation("password", "must not be empty"));
    }
    if password != confirm {
        return Err(StubError::validation(
            "passwordConfirm",
            "must match password",
        ));
    }
    Ok(password.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_ref() {
        assert_eq!(require_ref("project", Some(IdRef { id: 4 })).unwrap(), 4);
        assert!(require_ref("project", Some(IdRef { id: 0 })).is_err());
        assert!(require_ref("project", None).is_err());
    }

    #[test]
    fn test_one_of() {
        let allowed = ["JSON", "XML", "CSV"];
        assert_eq!(one_of("format", None, "JSON", &allowed).unwrap(), "JSON");
        assert_eq!(
            one_of("format", Some("CSV".into()), "JSON", &allowed).unwrap(),
            "CSV"
        );
        assert!(one_of("format", Some("YAML".into()), "JSON", &allowed).is_err());
    }

    #[test]
    fn test_require_password() {
        assert!(require_password("a", "a").is_ok());
        assert!(require_password("a", "b").is_err());
        assert!(require_password("", "").is_err());
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("name", "  x ").unwrap(), "x");
        assert!(require_text("name", "   ").is_err());
    }
}
