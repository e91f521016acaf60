//! Sequential suite orchestration.
//!
//! A [`ContractSuite`] holds named cases and runs them one after another in
//! ascending name order. Around every case:
//!
//! - setup logs in a fresh administrative session
//! - teardown runs the [`Cleanup`], whether or not the case passed
//!
//! A teardown failure turns an otherwise passing case into a failure.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::cleanup::Cleanup;
use crate::client::{AdminSession, ContractClient};
use crate::error::{ContractError, ContractResult};
use crate::fixtures::Fixtures;
use crate::request::{HttpRequest, HttpRequestBuilder};
use crate::response::HttpResponse;
use crate::validator::ResponseValidator;

/// Boxed future returned by case functions.
pub type CaseFuture<'a> = Pin<Box<dyn Future<Output = ContractResult<()>> + Send + 'a>>;

/// Signature of a case written as a plain function.
pub type CaseFn = for<'a> fn(&'a CaseContext) -> CaseFuture<'a>;

/// What a case has at hand while running.
#[derive(Debug, Clone)]
pub struct CaseContext {
    client: ContractClient,
    session: AdminSession,
}

impl CaseContext {
    pub fn new(client: ContractClient, session: AdminSession) -> Self {
        Self { client, session }
    }

    pub fn client(&self) -> &ContractClient {
        &self.client
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn fixtures(&self) -> Fixtures<'_> {
        Fixtures::new(&self.client, &self.session)
    }

    /// Attaches the admin token and a JSON content type.
    pub fn as_admin(&self, builder: HttpRequestBuilder) -> HttpRequestBuilder {
        self.session
            .authorize(builder)
            .with_content_type_header("application/json")
    }

    /// Builds and sends a request.
    pub async fn send(&self, builder: HttpRequestBuilder) -> ContractResult<(HttpRequest, HttpResponse)> {
        let request = builder.build()?;
        let response = self.client.execute(&request).await?;
        Ok((request, response))
    }

    /// Validates a response, logging actual body and expected shape on failure.
    pub fn check(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
        validator: &ResponseValidator,
    ) -> ContractResult<()> {
        let report = validator.validate(response);
        if !report.passed() {
            warn!(
                request = %request.label(),
                status = response.status(),
                actual = %report.actual_body(),
                expected = ?report.expected_shape(),
                "Response does not match"
            );
        }
        report.into_result(request.label())
    }
}

/// A single named case.
#[async_trait]
pub trait ContractCase: Send + Sync {
    /// Unique name; determines run order.
    fn name(&self) -> &str;

    /// Runs the case body.
    async fn run(&self, ctx: &CaseContext) -> ContractResult<()>;
}

/// A case backed by a plain function.
#[derive(Clone)]
pub struct FnCase {
    name: String,
    body: CaseFn,
}

impl FnCase {
    pub fn new(name: impl Into<String>, body: CaseFn) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

#[async_trait]
impl ContractCase for FnCase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &CaseContext) -> ContractResult<()> {
        (self.body)(ctx).await
    }
}

/// Outcome of one case.
#[derive(Debug)]
pub enum CaseOutcome {
    Passed,
    Failed(ContractError),
}

impl CaseOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }
}

/// Outcome of one case with its name and timing.
#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub outcome: CaseOutcome,
    pub duration: Duration,
}

/// Outcome of a whole suite run.
#[derive(Debug)]
pub struct SuiteReport {
    pub suite: String,
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    /// Returns true when every case passed.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_passed())
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    /// Returns the failed cases with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ContractError)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            CaseOutcome::Failed(e) => Some((r.name.as_str(), e)),
            CaseOutcome::Passed => None,
        })
    }

    /// Looks up the outcome of a case by name.
    pub fn outcome(&self, name: &str) -> Option<&CaseOutcome> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {}/{} passed",
            self.suite,
            self.passed_count(),
            self.results.len()
        )?;
        for result in &self.results {
            match &result.outcome {
                CaseOutcome::Passed => {
                    writeln!(f, "  ok      {} ({:?})", result.name, result.duration)?
                }
                CaseOutcome::Failed(e) => writeln!(f, "  FAILED  {}: {}", result.name, e)?,
            }
        }
        Ok(())
    }
}

/// Named cases run sequentially in name order.
#[derive(Clone)]
pub struct ContractSuite {
    name: String,
    cases: BTreeMap<String, Arc<dyn ContractCase>>,
}

impl ContractSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: BTreeMap::new(),
        }
    }

    /// Registers a case. A case with the same name replaces the earlier one.
    pub fn with_case(mut self, case: impl ContractCase + 'static) -> Self {
        self.cases.insert(case.name().to_string(), Arc::new(case));
        self
    }

    /// Registers a case written as a plain function.
    pub fn with_fn(self, name: &str, body: CaseFn) -> Self {
        self.with_case(FnCase::new(name, body))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns case names in run order.
    pub fn case_names(&self) -> Vec<&str> {
        self.cases.keys().map(String::as_str).collect()
    }

    /// Keeps only the cases whose name contains `pattern`.
    pub fn filtered(mut self, pattern: &str) -> Self {
        self.cases.retain(|name, _| name.contains(pattern));
        self
    }

    /// Runs every case in name order.
    pub async fn run(&self, client: &ContractClient, cleanup: &Cleanup) -> SuiteReport {
        info!(suite = %self.name, cases = self.cases.len(), "Running suite");
        let mut results = Vec::with_capacity(self.cases.len());

        for (name, case) in &self.cases {
            let started = Instant::now();
            info!(case = %name, "Running case");

            let body = match client.admin_session().await {
                Ok(session) => {
                    let ctx = CaseContext::new(client.clone(), session);
                    case.run(&ctx).await
                }
                Err(e) => Err(e),
            };
            let teardown = cleanup.run().await;

            let outcome = match (body, teardown) {
                (Ok(()), Ok(())) => CaseOutcome::Passed,
                (Err(e), _) | (Ok(()), Err(e)) => CaseOutcome::Failed(e),
            };
            let duration = started.elapsed();

            match &outcome {
                CaseOutcome::Passed => info!(case = %name, ?duration, "Case passed"),
                CaseOutcome::Failed(e) => error!(case = %name, error = %e, "Case failed"),
            }

            results.push(CaseResult {
                name: name.clone(),
                outcome,
                duration,
            });
        }

        let report = SuiteReport {
            suite: self.name.clone(),
            results,
        };
        info!(
            suite = %self.name,
            passed = report.passed_count(),
            total = report.results.len(),
            "Suite finished"
        );
        report
    }
}
