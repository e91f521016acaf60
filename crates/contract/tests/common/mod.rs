//! Shared harness for tests that run against the in-memory stub.

use std::sync::Arc;

use hyperiot_contract::{Cleanup, ContractClient, ContractConfig, StubTruncator};
use hyperiot_stub::{MemoryStore, RunningStub, StubConfig};

/// A running stub with a client and cleanup pointed at it.
pub struct Harness {
    pub stub: RunningStub,
    pub client: ContractClient,
    pub cleanup: Cleanup,
}

impl Harness {
    pub fn store(&self) -> &MemoryStore {
        &self.stub.store
    }
}

/// Starts a stub on an ephemeral port.
pub async fn start() -> Harness {
    let stub = hyperiot_stub::spawn(StubConfig::for_testing())
        .await
        .expect("Failed to start stub");
    let client = ContractClient::new(ContractConfig::for_testing(stub.base_url.clone()))
        .expect("Failed to create client");
    let cleanup = Cleanup::for_hproject_suite(Arc::new(StubTruncator(Arc::clone(&stub.store))));

    Harness {
        stub,
        client,
        cleanup,
    }
}
