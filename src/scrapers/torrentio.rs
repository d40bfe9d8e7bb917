use super::traits::SourceScraper;
use super::{hash_to_magnet, titles};
use crate::fetch::{FetchClient, FetchOptions};
use crate::Result;
use crate::types::{Quality, Source, Video, VideoType, is_junk_release};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const TORRENTIO_BASE_URL: &str = "https://torrentio.strem.fun";

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    /// Addon label, carries the resolution ("Torrentio\n1080p")
    name: String,
    /// Release name plus seed/size metadata lines
    title: String,
    #[serde(rename = "infoHash")]
    info_hash: String,
}

/// Stremio torrent-addon scraper.
///
/// Streams come keyed by IMDB ID, so no title check is needed; the
/// release name still goes through the junk filter.
pub struct TorrentioScraper {
    client: FetchClient,
    base_url: String,
}

impl TorrentioScraper {
    pub fn new(client: FetchClient) -> Self {
        Self::with_base_url(client, TORRENTIO_BASE_URL)
    }

    pub fn with_base_url(client: FetchClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn stream_to_source(&self, stream: Stream) -> Option<Source> {
        let release = titles::clean_release_title(
            stream.title.lines().next().unwrap_or_default(),
        );
        if release.is_empty() || is_junk_release(&release) {
            return None;
        }

        // Resolution rides on the addon label, the rest on the release name
        let quality = Quality::from_release_name(&stream.name)
            .max(Quality::from_release_name(&release));

        Some(
            Source::new(
                hash_to_magnet(&stream.info_hash, &release),
                "magnet",
                self.id(),
            )
            .with_quality(quality)
            .with_debrid_only(true)
            .with_size(Source::parse_size(&stream.title))
            .with_seeders(Source::parse_seeders(&stream.title))
            .with_release_name(release),
        )
    }
}

#[async_trait]
impl SourceScraper for TorrentioScraper {
    fn id(&self) -> &'static str {
        "torrentio"
    }

    fn name(&self) -> &'static str {
        "Torrentio"
    }

    fn supported_types(&self) -> &[VideoType] {
        &[VideoType::Movie, VideoType::Episode]
    }

    async fn get_sources(&self, video: &Video) -> Result<Vec<Source>> {
        // The addon is addressed by IMDB ID only
        let Some(ref imdb) = video.ids.imdb else {
            debug!("torrentio skipped: no imdb id");
            return Ok(Vec::new());
        };

        let url = match (video.video_type, video.season, video.episode) {
            (VideoType::Episode, Some(season), Some(episode)) => {
                format!("{}/stream/series/{imdb}:{season}:{episode}.json", self.base_url)
            }
            (VideoType::Movie, ..) => {
                format!("{}/stream/movie/{imdb}.json", self.base_url)
            }
            _ => return Ok(Vec::new()),
        };

        let response: StreamResponse = self.client.get_json(&url, &FetchOptions::new()).await?;

        let sources: Vec<Source> = response
            .streams
            .into_iter()
            .filter_map(|s| self.stream_to_source(s))
            .collect();

        debug!(count = sources.len(), "torrentio sources");
        Ok(sources)
    }
}
