// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Account store abstraction with in-memory and flat-file implementations.
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::Account;

mod flat_file;
mod memory;

pub use flat_file::FlatFileAccountStore;
pub use memory::MemoryAccountStore;

/// Failures reported by an account store
#[derive(Error, Debug)]
pub enum StoreError {
    /// An account with this login already exists
    #[error("account already exists: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted record could not be decoded
    #[error("corrupt record for {login}: {source}")]
    Corrupt {
        login: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Trait for account store backends
///
/// Every call goes to the store of record; implementations must not cache.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Exact-match lookup. A missing account is `Ok(None)`, not an error.
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, StoreError>;

    /// Insert a new account with a zero balance.
    ///
    /// Uniqueness of `login` is enforced atomically here: when another
    /// account with the same login exists (or wins a concurrent create),
    /// this returns [`StoreError::Conflict`] and leaves the existing record untouched.
    async fn create(&self, login: &str, password: &str) -> Result<Account, StoreError>;
}

#[async_trait]
impl<T: AccountStore + ?Sized> AccountStore for Arc<T> {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, StoreError> {
        (**self).find_by_login(login).await
    }

    async fn create(&self, login: &str, password: &str) -> Result<Account, StoreError> {
        (**self).create(login, password).await
    }
}
