//! HyperIoT contract verifier
//!
//! Runs the HProject response-shape suite against a HyperIoT service, or
//! against an in-process stub with `--embedded`, and exits non-zero when a
//! case fails.

mod embedded;

use std::sync::Arc;

use clap::Parser;
use hyperiot_contract::{
    Cleanup, ContractClient, ContractConfig, NoopTruncator, StubTruncator, TableTruncator,
    hproject, init_logging,
};
use hyperiot_stub::RunningStub;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "hyperiot-verify")]
#[command(about = "Verifies HyperIoT REST response shapes")]
struct Cli {
    #[command(flatten)]
    config: ContractConfig,

    /// Run against an in-process stub instead of `--base-url`.
    #[arg(long)]
    embedded: bool,

    /// Only run cases whose name contains this text.
    #[arg(long)]
    filter: Option<String>,
}

/// Picks how tables are emptied after each case.
fn create_truncator(
    config: &ContractConfig,
    stub: Option<&RunningStub>,
) -> anyhow::Result<Arc<dyn TableTruncator>> {
    if let Some(stub) = stub {
        return Ok(Arc::new(StubTruncator(Arc::clone(&stub.store))));
    }
    match config.database_url.as_deref() {
        Some(url) => create_postgres_truncator(url),
        None => {
            info!("No database URL, tables will not be truncated");
            Ok(Arc::new(NoopTruncator))
        }
    }
}

#[cfg(feature = "postgres")]
fn create_postgres_truncator(url: &str) -> anyhow::Result<Arc<dyn TableTruncator>> {
    use hyperiot_contract::PostgresTruncator;

    info!("Truncating tables through PostgreSQL");
    Ok(Arc::new(PostgresTruncator::connect(url)?))
}

/// Fallback when the postgres feature is not enabled.
#[cfg(not(feature = "postgres"))]
fn create_postgres_truncator(_url: &str) -> anyhow::Result<Arc<dyn TableTruncator>> {
    anyhow::bail!(
        "Truncating through a database URL requires the 'postgres' feature. \
         Build with: cargo build -p hyperiot-verify --features postgres"
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cli.config;
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let stub = if cli.embedded {
        let stub = embedded::start(&config).await?;
        config.base_url = stub.base_url.clone();
        Some(stub)
    } else {
        None
    };

    let cleanup = Cleanup::for_hproject_suite(create_truncator(&config, stub.as_ref())?);
    let client = ContractClient::new(config.clone())?;

    let mut suite = hproject::suite();
    if let Some(pattern) = &cli.filter {
        suite = suite.filtered(pattern);
    }

    info!(
        base_url = %config.base_url,
        suite = suite.name(),
        cases = suite.case_names().len(),
        "Starting contract run"
    );
    let report = suite.run(&client, &cleanup).await;
    println!("{}", report);

    if let Some(stub) = stub {
        stub.shutdown();
    }
    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "hyperiot-verify",
            "--embedded",
            "--filter",
            "test00",
            "--admin-username",
            "root",
        ])
        .unwrap();
        assert!(cli.embedded);
        assert_eq!(cli.filter.as_deref(), Some("test00"));
        assert_eq!(cli.config.admin_username, "root");
    }

    #[test]
    fn test_noop_truncator_without_database() {
        let config = ContractConfig::for_testing("http://localhost:8181/hyperiot");
        assert!(create_truncator(&config, None).is_ok());
    }
}
