//! Implements the `Ledger` and `Accounts` traits with local data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a server. Set `KASA_IN_TEST_MODE` to use it.
//!
//! The state lives in `$KASA_HOME/.test_backend.json` so that each CLI invocation sees what the
//! previous ones wrote. A missing file means a fresh backend: a demo account holding some seed
//! transactions. Tokens are derived from the email address so that a login from one process is
//! still accepted by the next.

use crate::api::{Accounts, ApiError, Ledger};
use crate::model::{NewTransaction, Transaction, TransactionId, Transactions};
use crate::session::{AccessToken, Credentials};
use crate::{utils, Result};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

pub(crate) const DEMO_EMAIL: &str = "demo@kasa.test";
pub(crate) const DEMO_PASSWORD: &str = "demo";
const TOKEN_PREFIX: &str = "test-token:";

/// The data held by one test backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TestBackendState {
    /// email -> password
    pub(crate) users: BTreeMap<String, String>,
    /// email -> transactions in arrival order
    pub(crate) ledgers: BTreeMap<String, Vec<Transaction>>,
    pub(crate) next_id: u64,
}

impl TestBackendState {
    /// The state every backend starts with: the demo account and its seed transactions.
    pub(crate) fn seeded() -> Self {
        // parsed without reporting; missing timestamps are logged when the list is served
        let seed: Vec<Transaction> = serde_json::from_str(SEED_TRANSACTIONS).unwrap_or_default();
        let next_id = seed.len() as u64 + 1;
        let mut state = Self {
            next_id,
            ..Self::default()
        };
        state
            .users
            .insert(DEMO_EMAIL.to_string(), DEMO_PASSWORD.to_string());
        state.ledgers.insert(DEMO_EMAIL.to_string(), seed);
        state
    }

    fn user_for(&self, token: Option<&AccessToken>) -> Result<String> {
        let email = token
            .and_then(|t| t.secret().strip_prefix(TOKEN_PREFIX))
            .filter(|email| self.users.contains_key(*email))
            .ok_or_else(|| ApiError::Unauthorized {
                detail: "Could not validate credentials".to_string(),
            })?;
        Ok(email.to_string())
    }
}

/// An implementation of `Ledger` and `Accounts` that keeps its data in a local JSON file.
pub(crate) struct TestBackend {
    path: PathBuf,
    token: Option<AccessToken>,
}

impl TestBackend {
    /// Creates a handle to the backend stored at `path`, acting for whoever owns `token`.
    pub(crate) fn new(path: impl Into<PathBuf>, token: Option<AccessToken>) -> Self {
        Self {
            path: path.into(),
            token,
        }
    }

    /// Returns a copy of the current state.
    #[cfg(test)]
    pub(crate) async fn get_state(&self) -> TestBackendState {
        self.with_state(|state| Ok(state.clone()))
            .await
            .unwrap_or_default()
    }

    /// Replaces the current state.
    #[cfg(test)]
    pub(crate) async fn set_state(&self, new_state: TestBackendState) -> Result<()> {
        self.save(&new_state).await
    }

    async fn load(&self) -> Result<TestBackendState> {
        if !self.path.is_file() {
            debug!("Starting a fresh test backend at {}", self.path.display());
            return Ok(TestBackendState::seeded());
        }
        utils::deserialize(&self.path)
            .await
            .context("The test backend data is unreadable")
    }

    async fn save(&self, state: &TestBackendState) -> Result<()> {
        let json =
            serde_json::to_string_pretty(state).context("Unable to serialize test backend data")?;
        utils::write(&self.path, json).await
    }

    /// Loads the state, applies `f` and writes the state back if `f` succeeded.
    async fn with_state<T>(&self, f: impl FnOnce(&mut TestBackendState) -> Result<T>) -> Result<T> {
        let mut state = self.load().await?;
        let value = f(&mut state)?;
        self.save(&state).await?;
        Ok(value)
    }
}

#[async_trait::async_trait]
impl Ledger for TestBackend {
    async fn list_transactions(&mut self) -> Result<Transactions> {
        let token = self.token.clone();
        let transactions = self
            .with_state(|state| {
                let email = state.user_for(token.as_ref())?;
                let data = state.ledgers.get(&email).cloned().unwrap_or_default();
                Ok(Transactions::new(data))
            })
            .await?;
        transactions.report_missing_timestamps();
        Ok(transactions)
    }

    async fn add_transaction(&mut self, transaction: &NewTransaction) -> Result<()> {
        let token = self.token.clone();
        self.with_state(|state| {
            let email = state.user_for(token.as_ref())?;
            let id = state.next_id;
            state.next_id += 1;
            let stored = Transaction::new(
                id.to_string(),
                transaction.title(),
                transaction.amount(),
                transaction.r#type(),
                transaction.category(),
                Some(Utc::now()),
            );
            debug!("Test backend stored transaction {id} for {email}");
            state.ledgers.entry(email).or_default().push(stored);
            Ok(())
        })
        .await
    }

    async fn delete_transaction(&mut self, id: &TransactionId) -> Result<()> {
        let token = self.token.clone();
        self.with_state(|state| {
            let email = state.user_for(token.as_ref())?;
            let ledger = state.ledgers.entry(email).or_default();
            let before = ledger.len();
            ledger.retain(|t| t.id() != id);
            if ledger.len() == before {
                return Err(ApiError::Rejected {
                    status: 404,
                    detail: "Transaction not found".to_string(),
                }
                .into());
            }
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl Accounts for TestBackend {
    async fn register(&mut self, credentials: &Credentials) -> Result<()> {
        self.with_state(|state| {
            if state.users.contains_key(credentials.email()) {
                return Err(ApiError::Rejected {
                    status: 400,
                    detail: "Email already registered".to_string(),
                }
                .into());
            }
            state.users.insert(
                credentials.email().to_string(),
                credentials.password().to_string(),
            );
            Ok(())
        })
        .await
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<AccessToken> {
        self.with_state(|state| match state.users.get(credentials.email()) {
            Some(password) if password == credentials.password() => Ok(AccessToken::new(
                format!("{TOKEN_PREFIX}{}", credentials.email()),
            )),
            _ => Err(ApiError::Rejected {
                status: 400,
                detail: "Incorrect email or password".to_string(),
            }
            .into()),
        })
        .await
    }
}

/// Seed transactions for the demo account. One amount arrives as a string and one record has no
/// timestamp, as happens with real data.
const SEED_TRANSACTIONS: &str = r#"[
  {"id": 1, "title": "Günlük satış", "amount": 2450, "type": "income", "category": "Ciro/Satış", "created_at": "2025-10-01T18:30:00"},
  {"id": 2, "title": "Dükkan kirası", "amount": 12000, "type": "expense", "category": "Kira", "created_at": "2025-10-02T09:00:00"},
  {"id": 3, "title": "Sebze hal alımı", "amount": "860.50", "type": "expense", "category": "Mutfak/Gıda", "created_at": "2025-10-03T07:15:00"},
  {"id": 4, "title": "Elektrik faturası", "amount": 1340, "type": "expense", "category": "Elektrik", "created_at": "2025-10-05T11:00:00"},
  {"id": 5, "title": "Hafta sonu satış", "amount": 5120, "type": "income", "category": "Ciro/Satış", "created_at": "2025-10-06T20:45:00"},
  {"id": 6, "title": "Toptan mal", "amount": 3200, "type": "expense", "category": "Mal Alımı"}
]"#;
