//! In-process stub used with `--embedded`.

use hyperiot_contract::ContractConfig;
use hyperiot_stub::{RunningStub, StubConfig};
use tracing::info;

/// Starts a stub on an ephemeral port seeded with the configured
/// administrator.
pub async fn start(config: &ContractConfig) -> anyhow::Result<RunningStub> {
    let stub_config = StubConfig {
        admin_username: config.admin_username.clone(),
        admin_password: config.admin_password.clone(),
        request_timeout: config.request_timeout,
        ..StubConfig::for_testing()
    };
    let stub = hyperiot_stub::spawn(stub_config).await?;
    info!(base_url = %stub.base_url, "Embedded stub started");
    Ok(stub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_uses_configured_admin() {
        let config = ContractConfig {
            admin_username: "root".to_string(),
            ..ContractConfig::for_testing("http://unused")
        };
        let stub = start(&config).await.unwrap();
        assert!(stub.store.read().user_by_username("root").is_some());
        stub.shutdown();
    }
}
