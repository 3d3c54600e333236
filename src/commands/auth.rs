//! Account command handlers.
//!
//! - `kasa register` creates an account but does not sign in
//! - `kasa login` exchanges an email and password for a session that is kept in `.secrets`
//! - `kasa logout` forgets the session

use crate::app::App;
use crate::commands::Out;
use crate::session::{Credentials, Session};
use crate::Result;
use anyhow::Context;
use tracing::info;

/// Handles `kasa register`.
pub async fn register(app: &App, credentials: &Credentials) -> Result<Out<()>> {
    app.accounts()?
        .register(credentials)
        .await
        .with_context(|| format!("Unable to register {}", credentials.email()))?;
    Ok(format!(
        "Registered {}, run 'kasa login' to sign in",
        credentials.email()
    )
    .into())
}

/// Handles `kasa login`. Any previous session is replaced.
pub async fn login(app: &mut App, credentials: &Credentials) -> Result<Out<()>> {
    let token = app
        .accounts()?
        .login(credentials)
        .await
        .context("Unable to sign in")?;
    if let Some(previous) = app.session() {
        info!("Replacing the session for {}", previous.email());
    }
    app.sign_in(Session::new(credentials.email(), token)).await?;
    Ok(format!("Signed in as {}", credentials.email()).into())
}

/// Handles `kasa logout`.
pub async fn logout(app: &mut App) -> Result<Out<()>> {
    let email = app.session().map(|s| s.email().to_string());
    if !app.logout().await? {
        return Ok("You were not signed in".into());
    }
    Ok(match email {
        Some(email) => format!("Signed out {email}").into(),
        None => "Signed out".into(),
    })
}
