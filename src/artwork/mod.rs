mod downloader;
mod fanart;
mod tmdb;

pub use downloader::Downloader;
pub use fanart::FanartTvArtwork;
pub use tmdb::TmdbArtwork;

use crate::Result;
use crate::types::Video;
use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Image URLs for a video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub poster: Option<String>,
    pub fanart: Option<String>,
    pub banner: Option<String>,
    pub thumb: Option<String>,
    pub clearlogo: Option<String>,
}

impl Artwork {
    /// Merge with another set, keeping already-set fields
    pub fn merge(&mut self, other: Artwork) {
        if self.poster.is_none() {
            self.poster = other.poster;
        }
        if self.fanart.is_none() {
            self.fanart = other.fanart;
        }
        if self.banner.is_none() {
            self.banner = other.banner;
        }
        if self.thumb.is_none() {
            self.thumb = other.thumb;
        }
        if self.clearlogo.is_none() {
            self.clearlogo = other.clearlogo;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.poster.is_some()
            && self.fanart.is_some()
            && self.banner.is_some()
            && self.thumb.is_some()
            && self.clearlogo.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One artwork source, queried by external IDs
#[async_trait]
pub trait ArtworkProvider: Send + Sync {
    /// Provider identifier (e.g., "tmdb", "fanart.tv")
    fn id(&self) -> &'static str;

    /// Query order; higher runs first
    fn priority(&self) -> i32 {
        50
    }

    /// Fetch artwork for a video
    async fn artwork_for(&self, video: &Video) -> Result<Artwork>;
}

/// Queries providers in priority order until the artwork set is complete
/// or providers run out; results are cached per video
pub struct ArtworkService {
    providers: Vec<Arc<dyn ArtworkProvider>>,
    cache: Cache<String, Arc<Artwork>>,
}

impl ArtworkService {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            cache: Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(86400))
                .build(),
        }
    }

    pub fn add_provider<P: ArtworkProvider + 'static>(&mut self, provider: P) {
        self.providers.push(Arc::new(provider));
        self.providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));
    }

    pub fn providers(&self) -> &[Arc<dyn ArtworkProvider>] {
        &self.providers
    }

    /// Best-effort artwork lookup; provider failures degrade to whatever
    /// the others returned
    pub async fn artwork_for(&self, video: &Video) -> Artwork {
        let key = video.cache_key();

        if let Some(cached) = self.cache.get(&key).await {
            debug!(video = %video.title, "artwork cache hit");
            return (*cached).clone();
        }

        let mut artwork = Artwork::default();

        for provider in &self.providers {
            match provider.artwork_for(video).await {
                Ok(more) => {
                    artwork.merge(more);
                    if artwork.is_complete() {
                        break;
                    }
                }
                Err(e) => debug!(provider = provider.id(), "artwork lookup failed: {e}"),
            }
        }

        self.cache.insert(key, Arc::new(artwork.clone())).await;
        artwork
    }
}

impl Default for ArtworkService {
    fn default() -> Self {
        Self::new()
    }
}
