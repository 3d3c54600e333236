use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;
use tracing::debug;

/// Creates the data directory, its secrets subdirectory and an initial `config.json` that points
/// at `api_url` along with default dashboard settings.
///
/// # Arguments
/// - `kasa_home` - The directory that will be the root of data directory, e.g. `$HOME/kasa`
/// - `api_url` - The base URL of the ledger API, e.g. `https://esnaf-takip-backend.onrender.com`
///
/// # Errors
/// - Returns an error if `api_url` is not a usable http(s) URL.
/// - Returns an error if any file operations fail.
pub async fn init(kasa_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(kasa_home, api_url)
        .await
        .context("Unable to create the data directory and configs")?;
    debug!("Wrote {}", config.config_path().display());
    Ok(format!(
        "Successfully created the kasa directory at {} using {}",
        config.root().display(),
        config.api_url()
    )
    .into())
}
