//! Application configuration for wikiscribe.
//!
//! User config lives at `~/.wikiscribe/wikiscribe.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WikiError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "wikiscribe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".wikiscribe";

/// User-Agent string for wiki requests.
pub const DEFAULT_USER_AGENT: &str = concat!("wikiscribe/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Config structs (matching wikiscribe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Wiki connection settings.
    #[serde(default)]
    pub wiki: WikiSection,
}

/// `[wiki]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiSection {
    /// Base URL of the wiki (e.g. `https://wiki.example.com`). Required.
    #[serde(default)]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests issued by the site indexer.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WikiSection {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> u32 {
    4
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

// ---------------------------------------------------------------------------
// Wiki config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime wiki configuration, validated and owned by the caller.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// Base URL; every routable URL must share its origin and path prefix.
    pub base_url: Url,
    /// Timeout applied to each fetch.
    pub timeout: Duration,
    /// Concurrency bound for the site indexer.
    pub concurrency: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl WikiConfig {
    /// Build a config with default limits for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::try_from(&AppConfig {
            wiki: WikiSection {
                base_url: base_url.into(),
                ..WikiSection::default()
            },
        })
    }

    /// `{base}/shelves`: the root of the shelf hierarchy.
    pub fn shelves_url(&self) -> String {
        format!("{}/shelves", self.base())
    }

    /// `{base}/books/`: prefix shared by every book and page URL.
    pub fn books_prefix(&self) -> String {
        format!("{}/books/", self.base())
    }

    /// `{base}/search`: the search endpoint, without query.
    pub fn search_url(&self) -> String {
        format!("{}/search", self.base())
    }

    /// Base URL as a string with no trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

impl TryFrom<&AppConfig> for WikiConfig {
    type Error = WikiError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let raw = config.wiki.base_url.trim();
        if raw.is_empty() {
            return Err(WikiError::config(
                "no wiki base URL configured. Set [wiki] base_url or pass --base-url",
            ));
        }

        let mut base_url = Url::parse(raw)
            .map_err(|e| WikiError::config(format!("invalid base URL '{raw}': {e}")))?;

        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            return Err(WikiError::config(format!(
                "base URL must be http or https, got '{raw}'"
            )));
        }
        if base_url.host_str().is_none() {
            return Err(WikiError::config(format!("base URL has no host: '{raw}'")));
        }

        base_url.set_query(None);
        base_url.set_fragment(None);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(config.wiki.timeout_secs.max(1)),
            concurrency: config.wiki.concurrency.max(1) as usize,
            user_agent: config.wiki.user_agent.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.wikiscribe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| WikiError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.wikiscribe/wikiscribe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WikiError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WikiError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WikiError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WikiError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WikiError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
