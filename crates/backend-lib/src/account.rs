// ============================
// crates/backend-lib/src/account.rs
// ============================
//! Account value type.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits a balance is stored and rendered with
pub const BALANCE_SCALE: u32 = 4;

/// Snapshot of a persisted account
///
/// Accounts are never mutated in place. Anything that changes an account
/// goes through the store and yields a new snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    login: String,
    // Stored and compared as plain text
    password: String,
    balance: Decimal,
}

impl Account {
    /// A freshly opened account with a zero balance
    pub fn open(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_balance(login, password, Decimal::ZERO)
    }

    pub fn with_balance(
        login: impl Into<String>,
        password: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        let mut balance = balance;
        balance.rescale(BALANCE_SCALE);
        Self {
            login: login.into(),
            password: password.into(),
            balance,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Exact, case-sensitive comparison against the stored password
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    /// Balance as fixed-point text with exactly four fractional digits
    pub fn formatted_balance(&self) -> String {
        let mut balance = self.balance;
        balance.rescale(BALANCE_SCALE);
        balance.to_string()
    }
}
