use super::{Artwork, ArtworkProvider};
use crate::fetch::ApiClient;
use crate::types::{Video, VideoType};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    backdrops: Vec<Image>,
    #[serde(default)]
    posters: Vec<Image>,
    #[serde(default)]
    logos: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    file_path: String,
    vote_average: Option<f64>,
}

/// TMDB images endpoint
pub struct TmdbArtwork {
    client: ApiClient,
    api_key: String,
}

impl TmdbArtwork {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, TMDB_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(base_url),
            api_key: api_key.into(),
        }
    }

    fn image_url(path: &str, size: &str) -> String {
        format!("{TMDB_IMAGE_BASE}/{size}{path}")
    }

    fn best(images: &[Image]) -> Option<&Image> {
        images.iter().max_by(|a, b| {
            a.vote_average
                .unwrap_or(0.0)
                .total_cmp(&b.vote_average.unwrap_or(0.0))
        })
    }
}

#[async_trait]
impl ArtworkProvider for TmdbArtwork {
    fn id(&self) -> &'static str {
        "tmdb"
    }

    fn priority(&self) -> i32 {
        90
    }

    async fn artwork_for(&self, video: &Video) -> Result<Artwork> {
        let tmdb_id = video
            .ids
            .tmdb
            .ok_or_else(|| Error::NotFound(format!("no tmdb id for {}", video.title)))?;

        let kind = if video.video_type == VideoType::Movie {
            "movie"
        } else {
            "tv"
        };

        let response: ImagesResponse = self
            .client
            .get_with_params(
                &format!("/{kind}/{tmdb_id}/images"),
                &[("api_key", self.api_key.as_str())],
            )
            .await?;

        Ok(Artwork {
            poster: Self::best(&response.posters).map(|i| Self::image_url(&i.file_path, "w500")),
            fanart: Self::best(&response.backdrops)
                .map(|i| Self::image_url(&i.file_path, "original")),
            thumb: Self::best(&response.backdrops).map(|i| Self::image_url(&i.file_path, "w300")),
            clearlogo: Self::best(&response.logos).map(|i| Self::image_url(&i.file_path, "w500")),
            banner: None,
        })
    }
}
