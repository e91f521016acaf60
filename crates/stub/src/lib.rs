//! # hyperiot-stub - In-memory HyperIoT REST service
//!
//! An axum service exposing the HyperIoT endpoints needed to create projects
//! and their devices, packets, fields, areas and users, and to read them back
//! in the platform's JSON shapes. Everything lives in memory; one
//! administrator is seeded from the configuration.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hyperiot_stub::{MemoryStore, StubConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = StubConfig::default();
//!     let store = Arc::new(MemoryStore::new(&config.admin_username, &config.admin_password));
//!     let app = create_app_with_config(store, config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8181").await?;
//!     axum::serve(listener, app).await
//! }
//! ```
//!
//! ## Authentication
//!
//! `POST /authentication/login` takes a form-encoded `username` and
//! `password` and answers `{ "token", "authenticable" }`. Every other API
//! route requires `Authorization: JWT <token>`; a missing or unknown token is
//! answered with 403.
//!
//! ## Errors
//!
//! Errors use the platform's body `{ "status", "errorMessages", "type" }`;
//! see [`error::StubError`].

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routing;
pub mod state;
pub mod store;
pub mod views;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

pub use config::StubConfig;
pub use error::{StubError, StubResult};
pub use state::AppState;
pub use store::{MemoryStore, StoreTable};

/// Creates the application with a fresh store and default configuration.
pub fn create_app() -> Router {
    let config = StubConfig::default();
    let store = Arc::new(MemoryStore::new(
        &config.admin_username,
        &config.admin_password,
    ));
    create_app_with_config(store, config)
}

/// Creates the application over the given store.
///
/// The store is shared so the caller can keep truncating it between cases.
pub fn create_app_with_config(store: Arc<MemoryStore>, config: StubConfig) -> Router {
    info!(base_path = %config.base_path, "Creating HyperIoT stub service");

    let timeout = Duration::from_secs(config.request_timeout);
    let state = AppState::new(store, config);
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));

    router.layer(service_builder)
}

/// A stub service running in the background.
#[derive(Debug)]
pub struct RunningStub {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl RunningStub {
    /// Stops the server.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Binds the configured address and serves the application in a background
/// task. Port 0 binds an ephemeral port.
pub async fn spawn(config: StubConfig) -> std::io::Result<RunningStub> {
    let store = Arc::new(MemoryStore::new(
        &config.admin_username,
        &config.admin_password,
    ));
    let listener = TcpListener::bind(config.socket_addr()).await?;
    let addr = listener.local_addr()?;
    let base_url = format!("http://{}{}", addr, config.normalized_base_path());
    let app = create_app_with_config(Arc::clone(&store), config);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Stub server stopped");
        }
    });
    info!(address = %addr, "Stub listening");

    Ok(RunningStub {
        addr,
        store,
        base_url,
        handle,
    })
}
