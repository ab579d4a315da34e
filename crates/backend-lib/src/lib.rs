// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the balance gateway: an XML endpoint that
//! opens prepaid accounts and reports their balances.

pub mod account;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod request;
pub mod response;
pub mod storage;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::{Settings, StorageBackend};
use crate::dispatcher::Dispatcher;
use crate::storage::{AccountStore, FlatFileAccountStore, MemoryAccountStore};

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Operation dispatcher over the account store
    pub dispatcher: Dispatcher<S>,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl<S: AccountStore> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(store)),
            settings: Arc::new(settings),
        }
    }

    /// The account store behind the dispatcher
    pub fn store(&self) -> &Arc<S> {
        self.dispatcher.store()
    }
}

/// Open the configured store and serve until `shutdown` resolves
pub async fn run<F>(settings: Settings, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %listener.local_addr()?, backend = ?settings.storage.backend, "listening");

    match settings.storage.backend {
        StorageBackend::Memory => {
            let state = Arc::new(AppState::new(MemoryAccountStore::new(), settings));
            gateway::serve(listener, state, shutdown).await?;
        },
        StorageBackend::File => {
            let store = FlatFileAccountStore::new(&settings.storage.path)?;
            info!(path = %store.root().display(), "using flat-file account store");
            let state = Arc::new(AppState::new(store, settings));
            gateway::serve(listener, state, shutdown).await?;
        },
    }

    info!("server stopped");
    Ok(())
}
