use crate::Result;
use crate::aggregator::AggregatorConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// HTTP fetch layer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-request timeout
    pub timeout_secs: u64,
    /// User-Agent pool, one picked per request
    pub user_agents: Vec<String>,
    /// Where the cookie jar is persisted
    pub cookie_jar: PathBuf,
    /// SQLite response cache location
    pub cache_db: PathBuf,
    /// Cache freshness window applied when a request does not set its own
    pub default_ttl_hours: f64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bifrost");

        Self {
            timeout_secs: 30,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0".to_string(),
            ],
            cookie_jar: data_dir.join("cookies.json"),
            cache_db: data_dir.join("responses.db"),
            default_ttl_hours: 1.0,
        }
    }
}

/// Trakt API credentials and token state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraktSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Artwork provider API keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanart_api_key: Option<String>,
}

/// Debrid service credentials; services without one are skipped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebridSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realdebrid_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premiumize_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alldebrid_api_key: Option<String>,
}

/// Per-scraper toggles and overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Scraper ids to leave out of the default aggregator
    pub disabled: Vec<String>,
    /// Base-URL overrides, for sites that hop domains
    pub base_urls: HashMap<String, String>,
}

/// Root configuration tree.
///
/// Layered defaults < optional TOML file < `BIFROST_`-prefixed environment
/// (with `__` as the section separator). A missing file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub aggregator: AggregatorConfig,
    pub trakt: TraktSettings,
    pub artwork: ArtworkSettings,
    pub debrid: DebridSettings,
    pub scrapers: ScraperSettings,
}

impl Settings {
    /// Load settings, optionally from a TOML file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(Environment::with_prefix("BIFROST").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Write the default configuration as a TOML file, for first-run setup
    pub fn write_default(path: &Path) -> Result<Self> {
        let settings = Self::default();
        let rendered = toml::to_string_pretty(&settings)
            .map_err(|e| crate::Error::Parse(format!("TOML render error: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, rendered)?;

        Ok(settings)
    }
}
