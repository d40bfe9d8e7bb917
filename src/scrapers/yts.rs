use super::traits::SourceScraper;
use super::{hash_to_magnet, titles};
use crate::fetch::{FetchClient, FetchOptions};
use crate::types::{Quality, Source, Video, VideoType};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const YTS_BASE_URL: &str = "https://yts.mx";

// API response shapes
#[derive(Debug, Deserialize)]
struct ListMoviesResponse {
    status: String,
    data: Option<MovieData>,
}

#[derive(Debug, Deserialize)]
struct MovieData {
    #[serde(default)]
    movies: Option<Vec<Movie>>,
}

#[derive(Debug, Deserialize)]
struct Movie {
    title: String,
    title_long: String,
    year: i32,
    #[serde(default)]
    torrents: Option<Vec<Torrent>>,
}

#[derive(Debug, Deserialize)]
struct Torrent {
    hash: String,
    quality: String,
    #[serde(rename = "type")]
    source_type: Option<String>,
    seeds: Option<u32>,
    size_bytes: Option<u64>,
}

/// YTS movie API scraper
pub struct YtsScraper {
    client: FetchClient,
    base_url: String,
}

impl YtsScraper {
    pub fn new(client: FetchClient) -> Self {
        Self::with_base_url(client, YTS_BASE_URL)
    }

    pub fn with_base_url(client: FetchClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn movie_to_sources(&self, movie: Movie, video: &Video) -> Vec<Source> {
        // The API fuzzy-matches; verify before emitting
        let title_ok = titles::normalize_title(&movie.title)
            == titles::normalize_title(&video.title);
        let year_ok = video
            .year
            .is_none_or(|wanted| (movie.year - wanted).abs() <= 1);

        if !title_ok || !year_ok {
            debug!(got = %movie.title_long, "yts result rejected by title check");
            return Vec::new();
        }

        movie
            .torrents
            .unwrap_or_default()
            .into_iter()
            .map(|t| {
                let release = format!(
                    "{} [{}] [{}]",
                    movie.title_long,
                    t.quality,
                    t.source_type.as_deref().unwrap_or("bluray"),
                );
                Source::new(hash_to_magnet(&t.hash, &release), "magnet", self.id())
                    .with_quality(Quality::from_label(&t.quality))
                    .with_debrid_only(true)
                    .with_size(t.size_bytes)
                    .with_seeders(t.seeds)
                    .with_release_name(release)
            })
            .collect()
    }
}

#[async_trait]
impl SourceScraper for YtsScraper {
    fn id(&self) -> &'static str {
        "yts"
    }

    fn name(&self) -> &'static str {
        "YTS"
    }

    fn supported_types(&self) -> &[VideoType] {
        &[VideoType::Movie]
    }

    async fn get_sources(&self, video: &Video) -> Result<Vec<Source>> {
        // IMDB lookup is exact; fall back to a title query
        let query = match video.ids.imdb {
            Some(ref imdb) => imdb.clone(),
            None => video.title.clone(),
        };

        let url = format!(
            "{}/api/v2/list_movies.json?query_term={}&limit=20",
            self.base_url,
            urlencoding::encode(&query)
        );

        let response: ListMoviesResponse =
            self.client.get_json(&url, &FetchOptions::new()).await?;

        if response.status != "ok" {
            return Err(Error::Api {
                status: 200,
                message: format!("yts status: {}", response.status),
            });
        }

        let movies = response
            .data
            .and_then(|d| d.movies)
            .unwrap_or_default();

        let sources: Vec<Source> = movies
            .into_iter()
            .flat_map(|m| self.movie_to_sources(m, video))
            .collect();

        debug!(count = sources.len(), "yts sources");
        Ok(sources)
    }
}
