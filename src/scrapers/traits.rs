use crate::Result;
use crate::types::{Source, Video, VideoType};
use async_trait::async_trait;
use std::time::Duration;

/// Core trait for site scrapers.
///
/// A scraper turns a [`Video`] into candidate [`Source`]s from one external
/// site. Implementations must not panic on malformed pages; parse failures
/// degrade to fewer (or zero) sources.
#[async_trait]
pub trait SourceScraper: Send + Sync {
    /// Scraper identifier (e.g., "yts", "torrentio")
    fn id(&self) -> &'static str;

    /// Human-readable scraper name
    fn name(&self) -> &'static str;

    /// Video types this scraper supports
    fn supported_types(&self) -> &[VideoType];

    /// Whether this scraper should be queried at all
    fn enabled(&self) -> bool {
        true
    }

    /// Upper bound on a single `get_sources` call; the aggregator enforces it
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    fn supports(&self, video: &Video) -> bool {
        self.supported_types().contains(&video.video_type)
    }

    /// Find candidate sources for a video
    async fn get_sources(&self, video: &Video) -> Result<Vec<Source>>;

    /// Resolve a source URL to its final playable form.
    ///
    /// Default is the identity; scrapers whose results point at detail
    /// pages override this to perform the second fetch.
    async fn resolve_link(&self, url: &str) -> Result<String> {
        Ok(url.to_string())
    }
}
