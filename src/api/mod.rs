//! The remote ledger API and the local stand-in used when testing.
//!
//! Everything that talks to the API goes through the `Ledger` and `Accounts` traits, so the rest of
//! the program does not know whether it is talking to a real server.

mod api_error;
mod http;
mod test_backend;

use crate::model::{NewTransaction, TransactionId, Transactions};
use crate::session::{AccessToken, Credentials};
use crate::{Config, Result};

pub use api_error::ApiError;
pub(crate) use api_error::is_unauthorized;
#[cfg(test)]
pub(crate) use test_backend::{TestBackend, TestBackendState, DEMO_EMAIL, DEMO_PASSWORD};

/// Environment variable that switches the program to the local test backend.
pub const TEST_MODE_ENV: &str = "KASA_IN_TEST_MODE";

/// Path segments of the API endpoints.
const TRANSACTIONS: &str = "transactions";
const AUTH: &str = "auth";
const LOGIN: &str = "login";
const REGISTER: &str = "register";

/// Operations on the signed-in user's transactions.
#[async_trait::async_trait]
pub trait Ledger {
    /// Fetches every transaction, in the order the API returns them.
    async fn list_transactions(&mut self) -> Result<Transactions>;

    /// Records a new transaction. The caller is expected to reload afterwards.
    async fn add_transaction(&mut self, transaction: &NewTransaction) -> Result<()>;

    /// Removes a transaction. The caller is expected to reload afterwards.
    async fn delete_transaction(&mut self, id: &TransactionId) -> Result<()>;
}

/// Account operations that do not need a session.
#[async_trait::async_trait]
pub trait Accounts {
    async fn register(&mut self, credentials: &Credentials) -> Result<()>;

    async fn login(&mut self, credentials: &Credentials) -> Result<AccessToken>;
}

/// Whether the program talks to the real API or to the local test backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Http,
    Test,
}

impl Mode {
    /// `Mode::Test` when `KASA_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Creates the `Ledger` for the signed-in user.
pub(crate) fn ledger(
    config: &Config,
    token: &AccessToken,
    mode: Mode,
) -> Result<Box<dyn Ledger + Send>> {
    Ok(match mode {
        Mode::Http => Box::new(http::HttpLedger::new(config.api_url().clone(), token.clone())?),
        Mode::Test => Box::new(test_backend::TestBackend::new(
            config.test_backend_path(),
            Some(token.clone()),
        )),
    })
}

/// Creates the `Accounts` client.
pub(crate) fn accounts(config: &Config, mode: Mode) -> Result<Box<dyn Accounts + Send>> {
    Ok(match mode {
        Mode::Http => Box::new(http::HttpAccounts::new(config.api_url().clone())?),
        Mode::Test => Box::new(test_backend::TestBackend::new(
            config.test_backend_path(),
            None,
        )),
    })
}
