//! Pagination extractor.
//!
//! Reads `delta` (page size) and `page` (1-based) from the query string. A
//! missing, zero or negative value falls back to the default.

use axum::{
    extract::{FromRequestParts, Query},
    http::{StatusCode, request::Parts},
};
use serde::Deserialize;

/// Page size used when `delta` is missing or not positive.
pub const DEFAULT_DELTA: usize = 10;

/// Page used when `page` is missing or not positive.
pub const DEFAULT_PAGE: usize = 1;

/// Normalized pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    delta: usize,
    page: usize,
}

#[derive(Debug, Deserialize)]
struct PaginationQuery {
    delta: Option<i64>,
    page: Option<i64>,
}

fn positive_or(value: Option<i64>, default: usize) -> usize {
    value
        .filter(|v| *v > 0)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

impl Pagination {
    /// Creates pagination from raw values, applying the defaults.
    pub fn new(delta: Option<i64>, page: Option<i64>) -> Self {
        Self {
            delta: positive_or(delta, DEFAULT_DELTA),
            page: positive_or(page, DEFAULT_PAGE),
        }
    }

    pub fn delta(&self) -> usize {
        self.delta
    }

    pub fn page(&self) -> usize {
        self.page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PaginationQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid pagination parameters"))?;

        Ok(Pagination::new(query.delta, query.page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let pagination = Pagination::default();
        assert_eq!(pagination.delta(), 10);
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn test_non_positive_falls_back() {
        let pagination = Pagination::new(Some(0), Some(-3));
        assert_eq!(pagination, Pagination::default());
    }

    #[test]
    fn test_explicit_values() {
        let pagination = Pagination::new(Some(5), Some(2));
        assert_eq!(pagination.delta(), 5);
        assert_eq!(pagination.page(), 2);
    }
}
