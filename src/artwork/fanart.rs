use super::{Artwork, ArtworkProvider};
use crate::fetch::ApiClient;
use crate::types::{Video, VideoType};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

const FANART_BASE_URL: &str = "https://webservice.fanart.tv/v3";

/// fanart.tv reports likes as strings
#[derive(Debug, Deserialize)]
struct FanartImage {
    url: String,
    likes: Option<String>,
}

impl FanartImage {
    fn likes(&self) -> u32 {
        self.likes
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Default, Deserialize)]
struct MovieArt {
    #[serde(default)]
    movieposter: Vec<FanartImage>,
    #[serde(default)]
    moviebackground: Vec<FanartImage>,
    #[serde(default)]
    moviebanner: Vec<FanartImage>,
    #[serde(default)]
    moviethumb: Vec<FanartImage>,
    #[serde(default)]
    hdmovielogo: Vec<FanartImage>,
}

#[derive(Debug, Default, Deserialize)]
struct ShowArt {
    #[serde(default)]
    tvposter: Vec<FanartImage>,
    #[serde(default)]
    showbackground: Vec<FanartImage>,
    #[serde(default)]
    tvbanner: Vec<FanartImage>,
    #[serde(default)]
    tvthumb: Vec<FanartImage>,
    #[serde(default)]
    hdtvlogo: Vec<FanartImage>,
}

/// fanart.tv provider. Movies are addressed by TMDB or IMDB ID, shows by
/// TVDB ID; episodes get their show's art.
pub struct FanartTvArtwork {
    client: ApiClient,
    api_key: String,
}

impl FanartTvArtwork {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, FANART_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(base_url),
            api_key: api_key.into(),
        }
    }

    fn most_liked(images: &[FanartImage]) -> Option<String> {
        images
            .iter()
            .max_by_key(|i| i.likes())
            .map(|i| i.url.clone())
    }
}

#[async_trait]
impl ArtworkProvider for FanartTvArtwork {
    fn id(&self) -> &'static str {
        "fanart.tv"
    }

    fn priority(&self) -> i32 {
        100
    }

    async fn artwork_for(&self, video: &Video) -> Result<Artwork> {
        let params = [("api_key", self.api_key.as_str())];

        if video.video_type == VideoType::Movie {
            let id = video
                .ids
                .tmdb
                .map(|id| id.to_string())
                .or_else(|| video.ids.imdb.clone())
                .ok_or_else(|| Error::NotFound(format!("no movie id for {}", video.title)))?;

            let art: MovieArt = self
                .client
                .get_with_params(&format!("/movies/{id}"), &params)
                .await?;

            return Ok(Artwork {
                poster: Self::most_liked(&art.movieposter),
                fanart: Self::most_liked(&art.moviebackground),
                banner: Self::most_liked(&art.moviebanner),
                thumb: Self::most_liked(&art.moviethumb),
                clearlogo: Self::most_liked(&art.hdmovielogo),
            });
        }

        let tvdb = video
            .ids
            .tvdb
            .ok_or_else(|| Error::NotFound(format!("no tvdb id for {}", video.title)))?;

        let art: ShowArt = self
            .client
            .get_with_params(&format!("/tv/{tvdb}"), &params)
            .await?;

        Ok(Artwork {
            poster: Self::most_liked(&art.tvposter),
            fanart: Self::most_liked(&art.showbackground),
            banner: Self::most_liked(&art.tvbanner),
            thumb: Self::most_liked(&art.tvthumb),
            clearlogo: Self::most_liked(&art.hdtvlogo),
        })
    }
}
