//! The signed-in state of the shop owner.
//!
//! A `Session` is saved to `$KASA_HOME/.secrets/session.json` when the user logs in and removed
//! when they log out. Nothing else about the user is kept on disk.

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use tracing::debug;

/// A bearer token issued by the API. It is never printed.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// An email and password pair used to register or log in.
#[derive(Clone, Eq, PartialEq, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    access_token: AccessToken,
    email: String,
    signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(email: impl Into<String>, access_token: AccessToken) -> Self {
        Self {
            access_token,
            email: email.into(),
            signed_in_at: Utc::now(),
        }
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }

    /// Loads the saved session, if there is one.
    pub(crate) async fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            debug!("No session file at {}", path.display());
            return Ok(None);
        }
        let session: Session = utils::deserialize(path)
            .await
            .context("The saved session is unreadable, log in again")?;
        Ok(Some(session))
    }

    /// Saves the session, readable only by the current user.
    pub(crate) async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Unable to serialize session")?;
        utils::write(path, json).await?;
        utils::restrict_permissions(path)
    }

    /// Deletes the saved session. Returns `false` if there was none.
    pub(crate) async fn clear(path: &Path) -> Result<bool> {
        utils::remove_file(path).await
    }
}
