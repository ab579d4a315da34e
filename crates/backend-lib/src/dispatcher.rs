// ============================
// crates/backend-lib/src/dispatcher.rs
// ============================
//! Operation dispatcher.
//!
//! Runs a validated [`Request`] against an [`AccountStore`] and produces an
//! [`Outcome`]. Business outcomes (duplicate login, unknown login, wrong
//! password) are ordinary results here. Store failures are logged and
//! collapsed into [`ResultCode::TechnicalError`]; their cause never leaves
//! this module.
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, error};

use crate::metrics::{OPERATION, STORE_FAILURE};
use crate::request::{Operation, Request};
use crate::storage::{AccountStore, StoreError};

/// Name of the extra carrying a balance
pub const BALANCE: &str = "balance";

/// Result codes written to `<result-code>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    Ok = 0,
    ClientAlreadyExists = 1,
    TechnicalError = 2,
    ClientDoesNotExist = 3,
    WrongPassword = 4,
}

impl ResultCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Short label used in logs and metrics
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ClientAlreadyExists => "client_already_exists",
            Self::TechnicalError => "technical_error",
            Self::ClientDoesNotExist => "client_does_not_exist",
            Self::WrongPassword => "wrong_password",
        }
    }
}

/// Typed result of a dispatched operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub code: ResultCode,
    /// Named values in insertion order
    pub extras: Vec<(String, String)>,
}

impl Outcome {
    pub fn new(code: ResultCode) -> Self {
        Self {
            code,
            extras: Vec::new(),
        }
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.push((name.into(), value.into()));
        self
    }

    /// First extra with the given name
    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Stateless dispatcher over a shared account store
pub struct Dispatcher<S> {
    store: Arc<S>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccountStore> Dispatcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one request to completion
    pub async fn dispatch(&self, request: &Request) -> Outcome {
        let outcome = match request.operation {
            Operation::CreateAccount => self.create_account(&request.login, &request.password).await,
            Operation::GetBalance => self.get_balance(&request.login, &request.password).await,
        };

        debug!(
            operation = %request.operation,
            login = %request.login,
            result = outcome.code.label(),
            "operation dispatched"
        );
        counter!(
            OPERATION,
            "operation" => request.operation.as_wire(),
            "result" => outcome.code.label()
        )
        .increment(1);

        outcome
    }

    async fn create_account(&self, login: &str, password: &str) -> Outcome {
        // Fast path only; the store still guards against a concurrent create
        match self.store.find_by_login(login).await {
            Ok(Some(_)) => return Outcome::new(ResultCode::ClientAlreadyExists),
            Ok(None) => {},
            Err(e) => return technical_error(Operation::CreateAccount, login, &e),
        }

        match self.store.create(login, password).await {
            Ok(_) => Outcome::new(ResultCode::Ok),
            Err(StoreError::Conflict(_)) => {
                debug!(login, "lost create race, account already exists");
                Outcome::new(ResultCode::ClientAlreadyExists)
            },
            Err(e) => technical_error(Operation::CreateAccount, login, &e),
        }
    }

    async fn get_balance(&self, login: &str, password: &str) -> Outcome {
        let account = match self.store.find_by_login(login).await {
            Ok(Some(account)) => account,
            Ok(None) => return Outcome::new(ResultCode::ClientDoesNotExist),
            Err(e) => return technical_error(Operation::GetBalance, login, &e),
        };

        if !account.password_matches(password) {
            return Outcome::new(ResultCode::WrongPassword);
        }

        Outcome::new(ResultCode::Ok).with_extra(BALANCE, account.formatted_balance())
    }
}

fn technical_error(operation: Operation, login: &str, err: &StoreError) -> Outcome {
    error!(%operation, login, error = %err, "account store failure");
    counter!(STORE_FAILURE, "operation" => operation.as_wire()).increment(1);
    Outcome::new(ResultCode::TechnicalError)
}
