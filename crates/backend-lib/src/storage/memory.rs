//! In-memory account store.
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{AccountStore, StoreError};
use crate::account::Account;

/// `DashMap`-backed store; contents live as long as the process
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(login).map(|entry| entry.value().clone()))
    }

    async fn create(&self, login: &str, password: &str) -> Result<Account, StoreError> {
        // The entry lock makes check-and-insert a single step
        match self.accounts.entry(login.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(login.to_string())),
            Entry::Vacant(slot) => {
                let account = Account::open(login, password);
                slot.insert(account.clone());
                Ok(account)
            },
        }
    }
}
