mod aggregator;
mod artwork;
mod config;
mod debrid;
mod fetch;
mod logging;
mod scrapers;
mod trakt;
mod types;

#[cfg(test)]
mod tests;

pub use aggregator::{AggregatorConfig, SourceAggregator};
pub use artwork::{Artwork, ArtworkProvider, ArtworkService, Downloader, FanartTvArtwork, TmdbArtwork};
pub use config::Settings;
pub use debrid::{AllDebrid, DebridResolver, DebridService, DirectLink, Premiumize, RealDebrid};
pub use fetch::{CachedResponse, FetchClient, FetchOptions, ResponseCache};
pub use logging::init_tracing;
pub use scrapers::{LeetxScraper, SourceScraper, TorrentioScraper, YtsScraper};
pub use trakt::{DeviceCode, EpisodeDetails, MediaDetails, TokenPair, TraktClient, TraktConfig};
pub use types::{ExternalIds, Quality, Source, Video, VideoType};

use std::time::Duration;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for source aggregation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded. Retry after: {0:?}")]
    RateLimit(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Challenge failed: {0}")]
    Challenge(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Create an aggregator with all bundled scrapers, wired to the given settings
pub async fn create_default_aggregator(settings: &Settings) -> Result<SourceAggregator> {
    let cache = ResponseCache::open(&settings.fetch.cache_db).await?;
    let client = FetchClient::with_cache(&settings.fetch, cache)?;

    let mut aggregator = SourceAggregator::with_config(settings.aggregator.clone());

    let enabled = |id: &str| !settings.scrapers.disabled.iter().any(|d| d == id);
    let base_url = |id: &str| settings.scrapers.base_urls.get(id).cloned();

    if enabled("yts") {
        aggregator.add_scraper(match base_url("yts") {
            Some(base) => YtsScraper::with_base_url(client.clone(), base),
            None => YtsScraper::new(client.clone()),
        });
    }
    if enabled("torrentio") {
        aggregator.add_scraper(match base_url("torrentio") {
            Some(base) => TorrentioScraper::with_base_url(client.clone(), base),
            None => TorrentioScraper::new(client.clone()),
        });
    }
    if enabled("1337x") {
        aggregator.add_scraper(match base_url("1337x") {
            Some(base) => LeetxScraper::with_base_url(client.clone(), base),
            None => LeetxScraper::new(client.clone()),
        });
    }

    let debrid = DebridResolver::from_settings(&settings.debrid);
    if !debrid.is_empty() {
        aggregator.set_debrid(debrid);
    }

    Ok(aggregator)
}

/// Create an artwork service with every provider that has a key configured
pub fn create_artwork_service(settings: &Settings) -> ArtworkService {
    let mut service = ArtworkService::new();

    if let Some(ref key) = settings.artwork.fanart_api_key {
        service.add_provider(FanartTvArtwork::new(key));
    }
    if let Some(ref key) = settings.artwork.tmdb_api_key {
        service.add_provider(TmdbArtwork::new(key));
    }

    service
}
