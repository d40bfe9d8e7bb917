use serde::{Deserialize, Serialize};

// Search
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub movie: Option<MovieEntity>,
    pub show: Option<ShowEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ids {
    pub trakt: Option<u64>,
    pub slug: Option<String>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub tvdb: Option<u64>,
}

// Entities (extended=full)
#[derive(Debug, Deserialize)]
pub struct MovieEntity {
    pub title: String,
    pub year: Option<i32>,
    pub ids: Ids,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub released: Option<String>,
    pub runtime: Option<i32>,
    pub trailer: Option<String>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub language: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub certification: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShowEntity {
    pub title: String,
    pub year: Option<i32>,
    pub ids: Ids,
    pub overview: Option<String>,
    pub first_aired: Option<String>,
    pub runtime: Option<i32>,
    pub network: Option<String>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub aired_episodes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeEntity {
    pub season: i32,
    pub number: i32,
    pub title: Option<String>,
    pub ids: Ids,
    pub overview: Option<String>,
    pub first_aired: Option<String>,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
}

// OAuth
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub created_at: Option<i64>,
}

/// Device pairing handle shown to the user
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    pub interval: u64,
}
