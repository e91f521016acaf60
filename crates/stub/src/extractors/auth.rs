//! Caller identity extractor.
//!
//! Reads `Authorization: JWT <token>` and resolves the token against the
//! store. A missing header, another scheme or an unknown token is rejected
//! with 403, as the platform does.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::error::StubError;
use crate::state::AppState;

/// Scheme expected in the `Authorization` header.
pub const AUTHORIZATION_SCHEME: &str = "JWT";

/// The authenticated user behind a request.
///
/// # Example
///
/// ```rust,ignore
/// use hyperiot_stub::extractors::Caller;
///
/// async fn handler(caller: Caller) {
///     println!("user {}", caller.user_id());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    user_id: i64,
    admin: bool,
}

impl Caller {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Fails unless the caller owns the entity or is an administrator.
    pub fn ensure_can_access(&self, owner_id: i64) -> Result<(), StubError> {
        if self.admin || self.user_id == owner_id {
            Ok(())
        } else {
            Err(StubError::Forbidden(
                "user is not allowed to access this entity".to_string(),
            ))
        }
    }
}

/// Extracts the token from the headers.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    (scheme == AUTHORIZATION_SCHEME && !token.trim().is_empty()).then(|| token.trim())
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = StubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| StubError::Forbidden("missing or malformed authorization".to_string()))?;

        let tables = state.store().read();
        let user = tables
            .user_for_token(token)
            .ok_or_else(|| StubError::Forbidden("unknown token".to_string()))?;

        Ok(Caller {
            user_id: user.id,
            admin: user.admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("JWT abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer abc")), None);
        assert_eq!(bearer_token(&headers("JWT ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_ensure_can_access() {
        let user = Caller {
            user_id: 5,
            admin: false,
        };
        assert!(user.ensure_can_access(5).is_ok());
        assert!(user.ensure_can_access(6).is_err());

        let admin = Caller {
            user_id: 1,
            admin: true,
        };
        assert!(admin.ensure_can_access(6).is_ok());
    }
}
