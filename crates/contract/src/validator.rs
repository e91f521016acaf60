//! Response validation.
//!
//! A [`ResponseValidator`] is declared once with a [`ResponseValidatorBuilder`]
//! and evaluated against an [`HttpResponse`]:
//!
//! 1. the body is parsed as JSON, when any property set was declared
//! 2. the status code is compared for equality
//! 3. for every declared path, the property names found there are compared
//!    against the expected list as sets: order is irrelevant, extras and
//!    omissions both fail
//! 4. custom criteria run against the raw response
//!
//! Paths are dotted (`results.user`). Resolution descends through objects by
//! key and, whenever it meets an array, checks every element on its own. A
//! path is a mismatch as soon as one branch reaches no object (absent key,
//! `null`, empty array), even when other elements resolve.
//!
//! ```rust
//! use hyperiot_contract::response::HttpResponse;
//! use hyperiot_contract::validator::ResponseValidator;
//!
//! let response = HttpResponse::new(
//!     200,
//!     Default::default(),
//!     r#"{"id": 1, "name": "p", "user": {"id": 2}}"#,
//! );
//!
//! let report = ResponseValidator::builder()
//!     .with_status_equal(200)
//!     .contain_exact_properties(["id", "name", "user"])
//!     .contain_exact_inner_properties("user", ["id"])
//!     .build()
//!     .validate(&response);
//!
//! assert!(report.passed());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ContractError, ContractResult};
use crate::properties::PAGINATED;
use crate::response::HttpResponse;

/// Label used for the top level of the body in diagnostics.
pub const ROOT_PATH: &str = "<root>";

/// A custom predicate over the raw response.
pub type Criterion = Arc<dyn Fn(&HttpResponse) -> bool + Send + Sync>;

/// One way in which a response differs from the declared expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The status code differs.
    Status { expected: u16, actual: u16 },

    /// Property sets were declared but the body is not JSON.
    UnparsableBody { message: String, body: String },

    /// The path does not lead to any object.
    MissingPath { path: String },

    /// The property names at `path` differ from the expected set.
    Properties {
        path: String,
        expected: BTreeSet<String>,
        actual: BTreeSet<String>,
    },

    /// A custom criterion returned false.
    Criterion { name: String },
}

impl Mismatch {
    /// Properties expected but absent. Empty for other variants.
    pub fn missing(&self) -> Vec<&str> {
        match self {
            Mismatch::Properties {
                expected, actual, ..
            } => expected.difference(actual).map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Properties present but not expected. Empty for other variants.
    pub fn unexpected(&self) -> Vec<&str> {
        match self {
            Mismatch::Properties {
                expected, actual, ..
            } => actual.difference(expected).map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Status { expected, actual } => {
                write!(f, "expected status {}, got {}", expected, actual)
            }
            Mismatch::UnparsableBody { message, .. } => {
                write!(f, "body is not JSON: {}", message)
            }
            Mismatch::MissingPath { path } => write!(f, "no object found at {}", path),
            Mismatch::Properties {
                path,
                expected,
                actual,
            } => write!(
                f,
                "properties at {} differ (missing {:?}, unexpected {:?}; expected {:?}, actual {:?})",
                path,
                self.missing(),
                self.unexpected(),
                expected,
                actual
            ),
            Mismatch::Criterion { name } => write!(f, "criterion '{}' not satisfied", name),
        }
    }
}

#[derive(Debug, Clone)]
struct PropertyExpectation {
    path: Vec<String>,
    expected: BTreeSet<String>,
}

impl PropertyExpectation {
    fn label(&self) -> String {
        if self.path.is_empty() {
            ROOT_PATH.to_string()
        } else {
            self.path.join(".")
        }
    }
}

/// A declared set of expectations over a response.
#[derive(Clone, Default)]
pub struct ResponseValidator {
    status: Option<u16>,
    properties: Vec<PropertyExpectation>,
    criteria: Vec<(String, Criterion)>,
}

impl fmt::Debug for ResponseValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseValidator")
            .field("status", &self.status)
            .field("properties", &self.properties)
            .field(
                "criteria",
                &self.criteria.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ResponseValidator {
    /// Starts declaring a validator.
    pub fn builder() -> ResponseValidatorBuilder {
        ResponseValidatorBuilder::default()
    }

    /// Evaluates the expectations against a response.
    pub fn validate(&self, response: &HttpResponse) -> ValidationReport {
        let mut mismatches = Vec::new();

        if let Some(expected) = self.status {
            if response.status() != expected {
                mismatches.push(Mismatch::Status {
                    expected,
                    actual: response.status(),
                });
            }
        }

        if !self.properties.is_empty() {
            match serde_json::from_str::<Value>(response.body()) {
                Ok(body) => {
                    for expectation in &self.properties {
                        check_properties(&body, expectation, &mut mismatches);
                    }
                }
                Err(e) => mismatches.push(Mismatch::UnparsableBody {
                    message: e.to_string(),
                    body: response.body().to_string(),
                }),
            }
        }

        for (name, criterion) in &self.criteria {
            if !criterion(response) {
                mismatches.push(Mismatch::Criterion { name: name.clone() });
            }
        }

        debug!(
            status = response.status(),
            mismatches = mismatches.len(),
            "Validated response"
        );

        ValidationReport {
            mismatches,
            expected_shape: self
                .properties
                .iter()
                .map(|p| (p.label(), p.expected.clone()))
                .collect(),
            actual_body: response.body().to_string(),
        }
    }
}

fn check_properties(
    body: &Value,
    expectation: &PropertyExpectation,
    mismatches: &mut Vec<Mismatch>,
) {
    let segments: Vec<&str> = expectation.path.iter().map(String::as_str).collect();
    let mut objects = Vec::new();
    let missing = collect_objects(body, &segments, &mut objects);

    if missing > 0 {
        mismatches.push(Mismatch::MissingPath {
            path: expectation.label(),
        });
    }

    // one report per distinct offending shape, not per element
    let mut seen = BTreeSet::new();
    for object in objects {
        let actual: BTreeSet<String> = object.keys().cloned().collect();
        if actual != expectation.expected && seen.insert(actual.clone()) {
            mismatches.push(Mismatch::Properties {
                path: expectation.label(),
                expected: expectation.expected.clone(),
                actual,
            });
        }
    }
}

/// Collects the objects at `path`, descending arrays element-wise.
///
/// Returns how many branches ended without an object: an absent key, a
/// `null` or scalar, or an empty array.
fn collect_objects<'a>(
    value: &'a Value,
    path: &[&str],
    out: &mut Vec<&'a Map<String, Value>>,
) -> usize {
    match value {
        Value::Array(items) if items.is_empty() => 1,
        Value::Array(items) => items
            .iter()
            .map(|item| collect_objects(item, path, out))
            .sum(),
        Value::Object(map) => match path.split_first() {
            None => {
                out.push(map);
                0
            }
            Some((head, rest)) => map
                .get(*head)
                .map_or(1, |child| collect_objects(child, rest, out)),
        },
        _ => 1,
    }
}

/// Builder for [`ResponseValidator`].
#[derive(Default)]
pub struct ResponseValidatorBuilder {
    validator: ResponseValidator,
}

impl ResponseValidatorBuilder {
    /// Requires the status code to equal `status`.
    pub fn with_status_equal(mut self, status: u16) -> Self {
        self.validator.status = Some(status);
        self
    }

    /// Requires the top-level object (or every element of a top-level array)
    /// to carry exactly these properties.
    pub fn contain_exact_properties<I, P>(self, properties: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.push(Vec::new(), properties)
    }

    /// Requires every object reached by the dotted `path` to carry exactly
    /// these properties.
    pub fn contain_exact_inner_properties<I, P>(self, path: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        self.push(segments, properties)
    }

    /// Requires the top level to be exactly the paginated envelope.
    pub fn contain_exact_paginated_properties(self) -> Self {
        self.contain_exact_properties(PAGINATED.iter().copied())
    }

    /// Adds a named predicate over the raw response.
    pub fn with_custom_criteria<F>(mut self, name: &str, criterion: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        self.validator
            .criteria
            .push((name.to_string(), Arc::new(criterion)));
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> ResponseValidator {
        self.validator
    }

    fn push<I, P>(mut self, path: Vec<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.validator.properties.push(PropertyExpectation {
            path,
            expected: properties.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// Outcome of [`ResponseValidator::validate`].
///
/// Keeps the actual body and the expected shape so callers can print both
/// when a check fails.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    mismatches: Vec<Mismatch>,
    expected_shape: Vec<(String, BTreeSet<String>)>,
    actual_body: String,
}

impl ValidationReport {
    /// Returns true when no mismatch was found.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Returns every mismatch found.
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Returns the declared property sets keyed by path label.
    pub fn expected_shape(&self) -> &[(String, BTreeSet<String>)] {
        &self.expected_shape
    }

    /// Returns the body that was validated.
    pub fn actual_body(&self) -> &str {
        &self.actual_body
    }

    /// Converts a failed report into [`ContractError::Assertion`].
    pub fn into_result(self, context: impl Into<String>) -> ContractResult<()> {
        if self.passed() {
            Ok(())
        } else {
            Err(ContractError::Assertion {
                context: context.into(),
                mismatches: self.mismatches,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use serde_json::json;

    fn response(status: u16, body: Value) -> HttpResponse {
        HttpResponse::new(status, HeaderMap::new(), body.to_string())
    }

    #[test]
    fn test_exact_match_passes_in_any_order() {
        let report = ResponseValidator::builder()
            .with_status_equal(200)
            .contain_exact_properties(["name", "id"])
            .build()
            .validate(&response(200, json!({"id": 1, "name": "x"})));
        assert!(report.passed());
    }

    #[test]
    fn test_extra_property_fails() {
        let report = ResponseValidator::builder()
            .contain_exact_properties(["id"])
            .build()
            .validate(&response(200, json!({"id": 1, "password": "secret"})));
        assert!(!report.passed());
        assert_eq!(report.mismatches()[0].unexpected(), vec!["password"]);
        assert!(report.mismatches()[0].missing().is_empty());
    }

    #[test]
    fn test_missing_property_fails() {
        let report = ResponseValidator::builder()
            .contain_exact_properties(["id", "entityVersion"])
            .build()
            .validate(&response(200, json!({"id": 1})));
        assert_eq!(report.mismatches()[0].missing(), vec!["entityVersion"]);
    }

    #[test]
    fn test_status_mismatch() {
        let report = ResponseValidator::builder()
            .with_status_equal(200)
            .build()
            .validate(&response(403, json!({})));
        assert_eq!(
            report.mismatches(),
            &[Mismatch::Status {
                expected: 200,
                actual: 403
            }]
        );
    }

    #[test]
    fn test_nested_path_through_arrays() {
        let body = json!({
            "numPages": 1, "currentPage": 1, "nextPage": 1, "delta": 10,
            "results": [
                {"id": 1, "user": {"id": 9, "admin": true}},
                {"id": 2, "user": {"id": 9, "admin": true}}
            ]
        });
        let report = ResponseValidator::builder()
            .contain_exact_paginated_properties()
            .contain_exact_inner_properties("results", ["id", "user"])
            .contain_exact_inner_properties("results.user", ["id", "admin"])
            .build()
            .validate(&response(200, body));
        assert!(report.passed(), "{:?}", report.mismatches());
    }

    #[test]
    fn test_top_level_array_checks_every_element() {
        let body = json!([{"id": 1}, {"id": 2, "extra": true}, {"id": 3, "extra": false}]);
        let report = ResponseValidator::builder()
            .contain_exact_properties(["id"])
            .build()
            .validate(&response(200, body));
        // both offending elements share one shape
        assert_eq!(report.mismatches().len(), 1);
    }

    #[test]
    fn test_missing_path_and_empty_array() {
        let report = ResponseValidator::builder()
            .contain_exact_inner_properties("device.project", ["id"])
            .build()
            .validate(&response(200, json!({"device": {"project": null}})));
        assert_eq!(
            report.mismatches(),
            &[Mismatch::MissingPath {
                path: "device.project".to_string()
            }]
        );

        let report = ResponseValidator::builder()
            .contain_exact_properties(["id"])
            .build()
            .validate(&response(200, json!([])));
        assert_eq!(
            report.mismatches(),
            &[Mismatch::MissingPath {
                path: ROOT_PATH.to_string()
            }]
        );
    }

    #[test]
    fn test_array_element_without_nested_object_fails() {
        let body = json!({
            "results": [
                {"id": 1, "user": {"id": 9, "admin": true}},
                {"id": 2, "user": null}
            ]
        });
        let report = ResponseValidator::builder()
            .contain_exact_inner_properties("results.user", ["id", "admin"])
            .build()
            .validate(&response(200, body));
        assert_eq!(
            report.mismatches(),
            &[Mismatch::MissingPath {
                path: "results.user".to_string()
            }]
        );

        let absent = json!({"results": [{"user": {"id": 9}}, {"id": 3}]});
        let report = ResponseValidator::builder()
            .contain_exact_inner_properties("results.user", ["id"])
            .build()
            .validate(&response(200, absent));
        assert!(!report.passed());
    }

    #[test]
    fn test_missing_branch_and_shape_both_reported() {
        let body = json!([{"user": {"id": 1, "extra": 0}}, {"user": 5}]);
        let report = ResponseValidator::builder()
            .contain_exact_inner_properties("user", ["id"])
            .build()
            .validate(&response(200, body));
        assert_eq!(report.mismatches().len(), 2);
        assert!(matches!(report.mismatches()[0], Mismatch::MissingPath { .. }));
        assert_eq!(report.mismatches()[1].unexpected(), vec!["extra"]);
    }

    #[test]
    fn test_empty_body_with_criteria_only() {
        let empty = HttpResponse::new(200, HeaderMap::new(), "");
        let report = ResponseValidator::builder()
            .with_status_equal(200)
            .with_custom_criteria("empty body", |r| r.body().is_empty())
            .build()
            .validate(&empty);
        assert!(report.passed());

        let not_empty = HttpResponse::new(200, HeaderMap::new(), "{}");
        let report = ResponseValidator::builder()
            .with_custom_criteria("empty body", |r| r.body().is_empty())
            .build()
            .validate(&not_empty);
        assert_eq!(
            report.mismatches(),
            &[Mismatch::Criterion {
                name: "empty body".to_string()
            }]
        );
    }

    #[test]
    fn test_unparsable_body() {
        let html = HttpResponse::new(500, HeaderMap::new(), "<html>oops</html>");
        let report = ResponseValidator::builder()
            .contain_exact_properties(["id"])
            .build()
            .validate(&html);
        assert!(matches!(
            report.mismatches()[0],
            Mismatch::UnparsableBody { .. }
        ));
        assert_eq!(report.actual_body(), "<html>oops</html>");
    }

    #[test]
    fn test_into_result_carries_expected_shape() {
        let report = ResponseValidator::builder()
            .contain_exact_properties(["id", "name"])
            .build()
            .validate(&response(200, json!({"id": 1})));
        assert_eq!(report.expected_shape()[0].0, ROOT_PATH);
        let err = report.into_result("GET /hprojects/1").unwrap_err();
        assert!(matches!(err, ContractError::Assertion { .. }));
        assert!(err.to_string().contains("name"));
    }
}
