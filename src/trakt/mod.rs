mod api_types;
mod client;

pub use api_types::DeviceCode;
pub use client::{TokenPair, TraktClient, TraktConfig};

use crate::types::{ExternalIds, VideoType};
use serde::{Deserialize, Serialize};

/// Movie or show details resolved through Trakt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDetails {
    pub video_type: VideoType,
    pub title: String,
    pub year: Option<i32>,
    pub ids: ExternalIds,
    pub overview: Option<String>,
    /// Release date (movies) or first-aired date (shows), YYYY-MM-DD
    pub released: Option<String>,
    /// Runtime in minutes
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub genres: Vec<String>,
    pub status: Option<String>,
    /// Broadcasting network, shows only
    pub network: Option<String>,
    pub tagline: Option<String>,
    pub trailer: Option<String>,
    pub language: Option<String>,
    pub certification: Option<String>,
    /// Aired episode count, shows only
    pub episode_count: Option<i32>,
}

/// Episode details resolved through Trakt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDetails {
    pub season: i32,
    pub number: i32,
    pub title: Option<String>,
    pub ids: ExternalIds,
    pub overview: Option<String>,
    pub first_aired: Option<String>,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
}

impl From<api_types::Ids> for ExternalIds {
    fn from(ids: api_types::Ids) -> Self {
        Self {
            trakt: ids.trakt,
            imdb: ids.imdb,
            tmdb: ids.tmdb,
            tvdb: ids.tvdb,
            slug: ids.slug,
        }
    }
}

impl From<api_types::MovieEntity> for MediaDetails {
    fn from(movie: api_types::MovieEntity) -> Self {
        Self {
            video_type: VideoType::Movie,
            title: movie.title,
            year: movie.year,
            ids: movie.ids.into(),
            overview: movie.overview,
            released: movie.released,
            runtime: movie.runtime,
            rating: movie.rating,
            votes: movie.votes,
            genres: movie.genres,
            status: movie.status,
            network: None,
            tagline: movie.tagline,
            trailer: movie.trailer,
            language: movie.language,
            certification: movie.certification,
            episode_count: None,
        }
    }
}

impl From<api_types::ShowEntity> for MediaDetails {
    fn from(show: api_types::ShowEntity) -> Self {
        Self {
            video_type: VideoType::Show,
            title: show.title,
            year: show.year,
            ids: show.ids.into(),
            overview: show.overview,
            released: show.first_aired,
            runtime: show.runtime,
            rating: show.rating,
            votes: show.votes,
            genres: show.genres,
            status: show.status,
            network: show.network,
            tagline: None,
            trailer: None,
            language: None,
            certification: None,
            episode_count: show.aired_episodes,
        }
    }
}

impl From<api_types::EpisodeEntity> for EpisodeDetails {
    fn from(episode: api_types::EpisodeEntity) -> Self {
        Self {
            season: episode.season,
            number: episode.number,
            title: episode.title,
            ids: episode.ids.into(),
            overview: episode.overview,
            first_aired: episode.first_aired,
            runtime: episode.runtime,
            rating: episode.rating,
            votes: episode.votes,
        }
    }
}
