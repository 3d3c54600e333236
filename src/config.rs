//! Configuration file handling for kasa.
//!
//! The configuration file is stored at `$KASA_HOME/config.json` and holds the URL of the ledger
//! API along with the dashboard presentation choices.

use crate::model::Categories;
use crate::stats::{BarBase, CategorySortOrder};
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "kasa";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SESSION_JSON: &str = "session.json";
const CONFIG_JSON: &str = "config.json";
const TEST_BACKEND_JSON: &str = ".test_backend.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$KASA_HOME` and from there it loads `$KASA_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the data directory, its secrets subdirectory and an initial `config.json` pointing
    /// at `api_url`.
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not an http(s) URL.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the kasa home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that `kasa_home` and its config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(kasa_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = kasa_home.into();
        if !maybe_relative.is_dir() {
            bail!(
                "The kasa home directory '{}' is missing, run 'kasa init' first",
                maybe_relative.display()
            )
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)
            .with_context(|| format!("Bad api_url in {}", config_path.display()))?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The configured category list, or the default one.
    pub fn categories(&self) -> Categories {
        self.config_file.categories.clone().unwrap_or_default()
    }

    pub fn category_sort(&self) -> CategorySortOrder {
        self.config_file.category_sort
    }

    pub fn bar_base(&self) -> BarBase {
        self.config_file.bar_base
    }

    /// Where the test backend keeps its data between runs in test mode.
    pub fn test_backend_path(&self) -> PathBuf {
        self.root.join(TEST_BACKEND_JSON)
    }

    /// Returns the stored `session_path` if it is absolute, otherwise resolves the relative path.
    pub fn session_path(&self) -> PathBuf {
        let p = self.config_file.session_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "kasa",
///   "config_version": 1,
///   "api_url": "https://esnaf-takip-backend.onrender.com/",
///   "category_sort": "descending",
///   "bar_base": "income",
///   "categories": ["Ciro/Satış", "Kira", "Diğer"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "kasa"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the ledger API
    api_url: String,

    /// How category totals are ordered on the dashboard
    #[serde(default)]
    category_sort: CategorySortOrder,

    /// Which total the category bars are measured against
    #[serde(default)]
    bar_base: BarBase,

    /// The category list, defaults to the built-in list when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    categories: Option<Categories>,

    /// Path to the session file (optional, relative to `$KASA_HOME` or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            category_sort: CategorySortOrder::default(),
            bar_base: BarBase::default(),
            categories: None,
            session_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if its contents are invalid
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "Config version {} is newer than this program supports ({})",
            config.config_version,
            CONFIG_VERSION
        );
        if let Some(categories) = &config.categories {
            categories
                .validate()
                .with_context(|| format!("Bad categories in {}", path.display()))?;
        }

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the session path. If None, defaults to `.secrets/session.json`.
    fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SESSION_JSON))
    }
}

/// Parses and checks the base URL of the ledger API.
fn parse_api_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).with_context(|| format!("Invalid API URL '{url}'"))?;
    ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "The API URL must use http or https, got '{}'",
        parsed.scheme()
    );
    ensure!(
        !parsed.cannot_be_a_base(),
        "The API URL '{url}' cannot be used as a base URL"
    );
    Ok(parsed)
}
