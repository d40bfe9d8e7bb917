use super::api_types::{DeviceCode, EpisodeEntity, MovieEntity, SearchResult, ShowEntity, TokenResponse};
use super::{EpisodeDetails, MediaDetails};
use crate::config::TraktSettings;
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const TRAKT_BASE_URL: &str = "https://api.trakt.tv";
const MAX_RETRIES: u32 = 3;

/// A stored access/refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        let expires_at = match (response.created_at, response.expires_in) {
            (Some(created), Some(expires)) => Utc.timestamp_opt(created + expires, 0).single(),
            _ => None,
        };
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
        }
    }
}

/// Trakt application credentials plus optional user tokens
#[derive(Debug, Clone, Default)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub tokens: Option<TokenPair>,
}

/// Trakt REST client.
///
/// All requests carry the api-key headers; user-scoped calls add a bearer
/// token. A 401 with a refresh token present triggers one token exchange
/// and replay; 429 honors Retry-After; 5xx retries with capped jittered
/// backoff.
pub struct TraktClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: Option<String>,
    tokens: RwLock<Option<TokenPair>>,
}

impl TraktClient {
    pub fn new(config: TraktConfig) -> Self {
        Self::with_base_url(config, TRAKT_BASE_URL)
    }

    pub fn with_base_url(config: TraktConfig, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("bifrost/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            client_id: config.client_id,
            client_secret: config.client_secret,
            tokens: RwLock::new(config.tokens),
        }
    }

    /// Build a client from the settings tree; fails without a client id
    pub fn from_settings(settings: &TraktSettings) -> Result<Self> {
        let client_id = settings
            .client_id
            .clone()
            .ok_or_else(|| Error::Auth("trakt client_id not configured".to_string()))?;

        let tokens = settings.access_token.clone().map(|access_token| TokenPair {
            access_token,
            refresh_token: settings.refresh_token.clone(),
            expires_at: None,
        });

        Ok(Self::new(TraktConfig {
            client_id,
            client_secret: settings.client_secret.clone(),
            tokens,
        }))
    }

    /// Current token pair, if any
    pub async fn tokens(&self) -> Option<TokenPair> {
        self.tokens.read().await.clone()
    }

    // Operations

    pub async fn search_movie(&self, query: &str, year: Option<i32>) -> Result<Vec<MediaDetails>> {
        let year_str = year.map(|y| y.to_string());
        let mut params = vec![("query", query), ("extended", "full")];
        if let Some(ref y) = year_str {
            params.push(("years", y));
        }

        let results: Vec<SearchResult> = self.request("/search/movie", &params).await?;
        Ok(results
            .into_iter()
            .filter_map(|r| r.movie.map(MediaDetails::from))
            .collect())
    }

    pub async fn search_show(&self, query: &str, year: Option<i32>) -> Result<Vec<MediaDetails>> {
        let year_str = year.map(|y| y.to_string());
        let mut params = vec![("query", query), ("extended", "full")];
        if let Some(ref y) = year_str {
            params.push(("years", y));
        }

        let results: Vec<SearchResult> = self.request("/search/show", &params).await?;
        Ok(results
            .into_iter()
            .filter_map(|r| r.show.map(MediaDetails::from))
            .collect())
    }

    /// Look up Trakt entities by an external ID (imdb, tmdb, tvdb)
    pub async fn lookup(&self, id_type: &str, id: &str) -> Result<Vec<MediaDetails>> {
        let results: Vec<SearchResult> = self
            .request(
                &format!("/search/{id_type}/{id}"),
                &[("type", "movie,show"), ("extended", "full")],
            )
            .await?;

        Ok(results
            .into_iter()
            .filter_map(|r| match r.kind.as_str() {
                "movie" => r.movie.map(MediaDetails::from),
                "show" => r.show.map(MediaDetails::from),
                _ => None,
            })
            .collect())
    }

    pub async fn movie(&self, id: &str) -> Result<MediaDetails> {
        let movie: MovieEntity = self
            .request(&format!("/movies/{id}"), &[("extended", "full")])
            .await?;
        Ok(movie.into())
    }

    pub async fn show(&self, id: &str) -> Result<MediaDetails> {
        let show: ShowEntity = self
            .request(&format!("/shows/{id}"), &[("extended", "full")])
            .await?;
        Ok(show.into())
    }

    pub async fn season(&self, show_id: &str, season: i32) -> Result<Vec<EpisodeDetails>> {
        let episodes: Vec<EpisodeEntity> = self
            .request(
                &format!("/shows/{show_id}/seasons/{season}"),
                &[("extended", "full")],
            )
            .await?;
        Ok(episodes.into_iter().map(EpisodeDetails::from).collect())
    }

    pub async fn episode(
        &self,
        show_id: &str,
        season: i32,
        episode: i32,
    ) -> Result<EpisodeDetails> {
        let episode: EpisodeEntity = self
            .request(
                &format!("/shows/{show_id}/seasons/{season}/episodes/{episode}"),
                &[("extended", "full")],
            )
            .await?;
        Ok(episode.into())
    }

    // Device pairing

    /// Start the device OAuth flow; show `user_code` and
    /// `verification_url` to the user, then poll
    pub async fn device_code(&self) -> Result<DeviceCode> {
        let body = serde_json::json!({ "client_id": self.client_id });
        let response = self
            .client
            .post(format!("{}/oauth/device/code", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::json_or_error(response).await
    }

    /// Poll until the user approves, the code expires, or Trakt rejects
    pub async fn poll_device_token(&self, code: &DeviceCode) -> Result<TokenPair> {
        let secret = self
            .client_secret
            .clone()
            .ok_or_else(|| Error::Auth("trakt client_secret not configured".to_string()))?;

        let body = serde_json::json!({
            "code": code.device_code,
            "client_id": self.client_id,
            "client_secret": secret,
        });

        let mut interval = code.interval.max(1);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(code.expires_in);

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Auth("device code expired".to_string()));
            }

            let response = self
                .client
                .post(format!("{}/oauth/device/token", self.base_url))
                .json(&body)
                .send()
                .await?;

            match response.status().as_u16() {
                200 => {
                    let tokens: TokenPair = response
                        .json::<TokenResponse>()
                        .await
                        .map_err(|e| Error::Parse(format!("JSON parse error: {e}")))?
                        .into();
                    *self.tokens.write().await = Some(tokens.clone());
                    info!("trakt device pairing complete");
                    return Ok(tokens);
                }
                400 => {
                    // Pending approval
                    tokio::time::sleep(Duration::from_secs(interval)).await;
                }
                429 => {
                    interval += 1;
                    tokio::time::sleep(Duration::from_secs(interval)).await;
                }
                404 => return Err(Error::Auth("invalid device code".to_string())),
                409 => return Err(Error::Auth("code already approved".to_string())),
                410 | 418 => {
                    return Err(Error::Auth("pairing expired or denied".to_string()));
                }
                status => {
                    return Err(Error::Api {
                        status,
                        message: response.text().await.unwrap_or_default(),
                    });
                }
            }
        }
    }

    // Internals

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut refreshed = false;
        let mut attempt: u32 = 0;

        loop {
            let token = self
                .tokens
                .read()
                .await
                .as_ref()
                .map(|t| t.access_token.clone());

            let mut request = self
                .client
                .request(Method::GET, &url)
                .query(params)
                .header("Content-Type", "application/json")
                .header("trakt-api-version", "2")
                .header("trakt-api-key", &self.client_id);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            let status = response.status();

            match status.as_u16() {
                200..=299 => {
                    return response
                        .json()
                        .await
                        .map_err(|e| Error::Parse(format!("JSON parse error: {e}")));
                }
                401 if !refreshed => {
                    debug!("trakt 401, trying token refresh");
                    self.refresh_tokens().await?;
                    refreshed = true;
                }
                401 => return Err(Error::Auth("trakt token rejected".to_string())),
                404 => return Err(Error::NotFound(endpoint.to_string())),
                429 => {
                    let wait = retry_after(&response).unwrap_or(Duration::from_secs(1));
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(Error::RateLimit(wait));
                    }
                    warn!("trakt rate limited, waiting {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                500..=599 => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(Error::Api {
                            status: status.as_u16(),
                            message: response.text().await.unwrap_or_default(),
                        });
                    }
                    let backoff = backoff_delay(attempt);
                    debug!("trakt {status}, retrying in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                }
                code => {
                    return Err(Error::Api {
                        status: code,
                        message: response.text().await.unwrap_or_default(),
                    });
                }
            }
        }
    }

    async fn refresh_tokens(&self) -> Result<()> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| Error::Auth("no refresh token".to_string()))?;
        let secret = self
            .client_secret
            .clone()
            .ok_or_else(|| Error::Auth("trakt client_secret not configured".to_string()))?;

        let body = serde_json::json!({
            "refresh_token": refresh_token,
            "client_id": self.client_id,
            "client_secret": secret,
            "redirect_uri": "urn:ietf:wg:oauth:2.0:oob",
            "grant_type": "refresh_token",
        });

        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .json(&body)
            .send()
            .await?;

        let tokens: TokenResponse = Self::json_or_error(response).await?;
        *self.tokens.write().await = Some(tokens.into());
        info!("trakt tokens refreshed");

        Ok(())
    }

    async fn json_or_error<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("trakt rejected request: {status}")));
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("JSON parse error: {e}")))
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = Duration::from_millis(500) * 2u32.pow(attempt.min(4));
    let jitter = Duration::from_millis(rand::rng().random_range(0..250));
    base + jitter
}
