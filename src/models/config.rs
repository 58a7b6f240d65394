//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store connection settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Catalog paging and cache fan-out settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Names of the entry properties the archive reads
    #[serde(default)]
    pub properties: PropertyNames,

    /// HTTP boundary settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override settings from environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("NOTION_DATABASE_ID") {
            self.store.database_id = id;
        }

        if let Some(bind) = lookup("ARCHIVE_BIND") {
            self.server.bind = bind;
        }

        if let Some(concurrent) = lookup("ARCHIVE_MAX_CONCURRENT") {
            if let Ok(n) = concurrent.parse() {
                self.sync.max_concurrent = n;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.store.user_agent.trim().is_empty() {
            return Err(AppError::validation("store.user_agent is empty"));
        }
        if self.store.timeout_secs == 0 {
            return Err(AppError::validation("store.timeout_secs must be > 0"));
        }
        if url::Url::parse(&self.store.base_url).is_err() {
            return Err(AppError::validation(format!(
                "store.base_url is not a valid URL: {}",
                self.store.base_url
            )));
        }
        if !(1..=100).contains(&self.sync.page_size) {
            return Err(AppError::validation("sync.page_size must be within 1..=100"));
        }
        if self.sync.max_concurrent == 0 {
            return Err(AppError::validation("sync.max_concurrent must be > 0"));
        }
        if self.properties.title.trim().is_empty() || self.properties.date.trim().is_empty() {
            return Err(AppError::validation(
                "properties.title and properties.date must be set",
            ));
        }
        Ok(())
    }

    /// The database to sync from.
    pub fn source_id(&self) -> Result<&str> {
        let id = self.store.database_id.trim();
        if id.is_empty() {
            return Err(AppError::config(
                "store.database_id is not set (or export NOTION_DATABASE_ID)",
            ));
        }
        Ok(id)
    }
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// API root, with trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Value sent in the `Notion-Version` header
    #[serde(default = "defaults::notion_version")]
    pub notion_version: String,

    /// Database whose rows make up the archive
    #[serde(default)]
    pub database_id: String,

    /// Environment variable holding the API token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            notion_version: defaults::notion_version(),
            database_id: String::new(),
            token_env: defaults::token_env(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Catalog paging and cache population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Entries requested per catalog page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Maximum body fetches in flight while populating the cache
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Property names mapped onto entry fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyNames {
    #[serde(default = "defaults::title_property")]
    pub title: String,

    #[serde(default = "defaults::date_property")]
    pub date: String,

    #[serde(default = "defaults::media_property")]
    pub media: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: defaults::title_property(),
            date: defaults::date_property(),
            media: defaults::media_property(),
        }
    }
}

/// HTTP boundary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output (server only)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            json: false,
        }
    }
}

mod defaults {
    // Store defaults
    pub fn base_url() -> String {
        "https://api.notion.com/v1/".into()
    }
    pub fn notion_version() -> String {
        "2022-06-28".into()
    }
    pub fn token_env() -> String {
        "NOTION_API_KEY".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; archive-sync/0.1)".into()
    }

    // Sync defaults
    pub fn page_size() -> usize {
        100
    }
    pub fn max_concurrent() -> usize {
        32
    }

    // Property defaults
    pub fn title_property() -> String {
        "Title".into()
    }
    pub fn date_property() -> String {
        "Date".into()
    }
    pub fn media_property() -> String {
        "YouTube".into()
    }

    // Server defaults
    pub fn bind() -> String {
        "127.0.0.1:8080".into()
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
