//! # hyperiot-contract - REST response-shape verification for HyperIoT
//!
//! This crate issues requests against a running HyperIoT service and checks
//! that every CRUD endpoint of the platform's entities answers with the
//! expected status code and exactly the expected JSON property sets.
//!
//! ## Building blocks
//!
//! - [`request`]: immutable request descriptions and their builder
//! - [`client`]: sends requests, logs in the administrative identity
//! - [`validator`]: exact property-set checks over nested paths
//! - [`properties`]: the expected property sets of each entity view
//! - [`fixtures`]: creates prerequisite entities with unique names
//! - [`cleanup`]: truncates entity tables after every case
//! - [`suite`]: runs named cases sequentially in name order
//! - [`hproject`]: the HProject cases
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hyperiot_contract::{Cleanup, ContractClient, ContractConfig, NoopTruncator, hproject};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ContractClient::new(ContractConfig::from_env())?;
//!     let cleanup = Cleanup::for_hproject_suite(Arc::new(NoopTruncator));
//!
//!     let report = hproject::suite().run(&client, &cleanup).await;
//!     println!("{}", report);
//!     assert!(report.all_passed());
//!     Ok(())
//! }
//! ```
//!
//! ## Property matching
//!
//! Property sets are compared exactly: an extra property fails a check just
//! like a missing one. Every full entity view carries
//! `id, entityCreateDate, entityModifyDate, entityVersion` in addition to
//! its own properties; views embedded inside another entity carry the
//! reduced sets listed in [`properties`].

pub mod cleanup;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod hproject;
pub mod model;
pub mod properties;
pub mod request;
pub mod response;
pub mod suite;
pub mod validator;

#[cfg(feature = "postgres")]
pub use cleanup::PostgresTruncator;
#[cfg(feature = "stub")]
pub use cleanup::StubTruncator;
pub use cleanup::{Cleanup, EntityTable, NoopTruncator, TableTruncator};
pub use client::{AdminSession, ContractClient};
pub use config::ContractConfig;
pub use error::{ContractError, ContractResult};
pub use fixtures::Fixtures;
pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::HttpResponse;
pub use suite::{CaseContext, CaseOutcome, ContractCase, ContractSuite, SuiteReport};
pub use validator::{Mismatch, ResponseValidator, ResponseValidatorBuilder, ValidationReport};

/// Initializes the tracing subscriber for the harness and the embedded stub.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "hyperiot_contract={level},hyperiot_verify={level},hyperiot_stub={level},tower_http=warn"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
