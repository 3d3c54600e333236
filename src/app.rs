//! The application context that every command runs in.

use crate::api::{self, Accounts, Ledger, Mode};
use crate::model::Transactions;
use crate::session::Session;
use crate::{Config, Result};
use anyhow::{bail, Context};
use tracing::{debug, info, warn};

/// Holds the configuration, the backend mode, and the current session (if anyone is signed in).
///
/// Signing in and out only ever happens through `sign_in` and `logout`, and the session on disk
/// always matches the one held here.
#[derive(Debug, Clone)]
pub struct App {
    config: Config,
    mode: Mode,
    session: Option<Session>,
}

impl App {
    /// Creates the context, picking up a saved session if there is one.
    pub async fn load(config: Config, mode: Mode) -> Result<Self> {
        let session = Session::load(&config.session_path()).await?;
        match &session {
            Some(s) => debug!("Signed in as {}", s.email()),
            None => debug!("Not signed in"),
        }
        Ok(Self {
            config,
            mode,
            session,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Saves `session` and makes it the current one.
    pub async fn sign_in(&mut self, session: Session) -> Result<()> {
        session
            .save(&self.config.session_path())
            .await
            .context("Unable to save the session")?;
        self.session = Some(session);
        Ok(())
    }

    /// Forgets the current session, in memory and on disk. Returns `false` if nobody was signed in.
    pub async fn logout(&mut self) -> Result<bool> {
        let had_session = self.session.take().is_some();
        let had_file = Session::clear(&self.config.session_path()).await?;
        Ok(had_session || had_file)
    }

    /// Fetches the full transaction list again.
    pub async fn reload(&mut self) -> Result<Transactions> {
        let result = match self.ledger() {
            Ok(mut ledger) => ledger.list_transactions().await,
            Err(e) => Err(e),
        };
        let transactions = self
            .guard(result)
            .await
            .context("Unable to load transactions")?;
        info!("Loaded {} transactions", transactions.len());
        Ok(transactions)
    }

    /// A client for the signed-in user's transactions.
    pub(crate) fn ledger(&self) -> Result<Box<dyn Ledger + Send>> {
        let Some(session) = &self.session else {
            bail!("You are not signed in, run 'kasa login' first");
        };
        api::ledger(&self.config, session.access_token(), self.mode)
    }

    pub(crate) fn accounts(&self) -> Result<Box<dyn Accounts + Send>> {
        api::accounts(&self.config, self.mode)
    }

    /// Passes `result` through, except that a rejected token ends the session so the user is sent
    /// back to the login step.
    pub(crate) async fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Err(e) if api::is_unauthorized(&e) => {
                warn!("The API no longer accepts the saved session");
                if let Err(logout_error) = self.logout().await {
                    warn!("Unable to clear the session: {logout_error:#}");
                }
                Err(e.context("Your session has ended, run 'kasa login' to sign in again"))
            }
            other => other,
        }
    }
}
