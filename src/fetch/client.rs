use super::cache::ResponseCache;
use super::cloudflare;
use crate::config::FetchSettings;
use crate::{Error, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method, Url};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const FALLBACK_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Per-request fetch options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Cache freshness window; `None` uses the client default, `Some(0.0)`
    /// bypasses the cache
    pub ttl_hours: Option<f64>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Referer header
    pub referer: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, hours: f64) -> Self {
        self.ttl_hours = Some(hours);
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.ttl_hours = Some(0.0);
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Cookie jar that mirrors received cookies to a JSON sidecar file, so
/// clearance cookies survive restarts
struct PersistentJar {
    inner: Jar,
    seen: DashMap<String, HashMap<String, String>>,
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl PersistentJar {
    fn load(path: Option<PathBuf>) -> Self {
        let jar = Self {
            inner: Jar::default(),
            seen: DashMap::new(),
            path,
            write_lock: Mutex::new(()),
        };

        if let Some(ref path) = jar.path
            && let Ok(raw) = std::fs::read_to_string(path)
            && let Ok(saved) = serde_json::from_str::<HashMap<String, Vec<String>>>(&raw)
        {
            for (host, cookies) in saved {
                let Ok(url) = Url::parse(&format!("https://{host}/")) else {
                    continue;
                };
                let mut names = HashMap::new();
                for cookie in cookies {
                    if let Some(name) = cookie.split('=').next() {
                        names.insert(name.to_string(), cookie.clone());
                    }
                    jar.inner.add_cookie_str(&cookie, &url);
                }
                jar.seen.insert(host, names);
            }
        }

        jar
    }

    fn persist(&self) {
        let Some(ref path) = self.path else {
            return;
        };

        let _guard = self.write_lock.lock();

        let saved: HashMap<String, Vec<String>> = self
            .seen
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().values().cloned().collect()))
            .collect();

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string(&saved) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    warn!("failed to persist cookie jar: {e}");
                }
            }
            Err(e) => warn!("failed to encode cookie jar: {e}"),
        }
    }
}

impl CookieStore for PersistentJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<HeaderValue> = cookie_headers.cloned().collect();

        if let Some(host) = url.host_str() {
            let mut names = self.seen.entry(host.to_string()).or_default();
            for header in &headers {
                if let Ok(raw) = header.to_str()
                    && let Some(name) = raw.split('=').next()
                {
                    names.insert(name.to_string(), raw.to_string());
                }
            }
        }

        self.inner.set_cookies(&mut headers.iter(), url);
        self.persist();
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.inner.cookies(url)
    }
}

/// HTTP client shared by every scraper: persisted cookie jar, gzip,
/// browser-like headers, TTL'd response cache, challenge handling
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    cache: Option<ResponseCache>,
    user_agents: Vec<String>,
    default_ttl_hours: f64,
}

impl FetchClient {
    /// Create a client without a response cache
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        Self::build(settings, None)
    }

    /// Create a client backed by a response cache
    pub fn with_cache(settings: &FetchSettings, cache: ResponseCache) -> Result<Self> {
        Self::build(settings, Some(cache))
    }

    fn build(settings: &FetchSettings, cache: Option<ResponseCache>) -> Result<Self> {
        let jar = Arc::new(PersistentJar::load(Some(settings.cookie_jar.clone())));

        let client = Client::builder()
            .cookie_provider(jar)
            .gzip(true)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            cache,
            user_agents: settings.user_agents.clone(),
            default_ttl_hours: settings.default_ttl_hours,
        })
    }

    fn user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map_or(FALLBACK_UA, String::as_str)
    }

    /// Cached GET returning the response body
    pub async fn get_html(&self, url: &str, options: &FetchOptions) -> Result<String> {
        self.fetch(Method::GET, url, None, options).await
    }

    /// Cached form POST returning the response body; the form body
    /// participates in the cache key
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        options: &FetchOptions,
    ) -> Result<String> {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.fetch(Method::POST, url, Some(body), options).await
    }

    /// Cached GET parsed as JSON
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<T> {
        let body = self.get_html(url, options).await?;
        serde_json::from_str(&body).map_err(|e| Error::Parse(format!("JSON parse error: {e}")))
    }

    async fn fetch(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        options: &FetchOptions,
    ) -> Result<String> {
        let ttl = options.ttl_hours.unwrap_or(self.default_ttl_hours);

        if let Some(cache) = &self.cache
            && ttl > 0.0
            && let Some(hit) = cache.get(url, body.as_deref(), ttl).await?
        {
            debug!(url, "response cache hit");
            return Ok(hit.body);
        }

        let parsed =
            Url::parse(url).map_err(|e| Error::Parse(format!("invalid URL {url}: {e}")))?;

        let (mut status, mut headers, mut text) = self
            .execute(method.clone(), parsed.clone(), body.as_deref(), options)
            .await?;

        if cloudflare::is_challenge_page(status, &text) {
            warn!(url, "challenge page, attempting solve");
            let challenge = cloudflare::solve_challenge(&parsed, &text)?;
            tokio::time::sleep(challenge.delay).await;

            // The clearance cookie arrives on the submit response
            self.client
                .get(&challenge.submit_url)
                .query(&challenge.params)
                .header(header::USER_AGENT, self.user_agent())
                .header(header::REFERER, url)
                .send()
                .await?;

            (status, headers, text) = self
                .execute(method, parsed, body.as_deref(), options)
                .await?;

            if cloudflare::is_challenge_page(status, &text) {
                return Err(Error::Challenge(format!("clearance not granted by {url}")));
            }
        }

        if !(200..300).contains(&status) {
            if status == 404 {
                return Err(Error::NotFound(url.to_string()));
            }
            return Err(Error::Api {
                status,
                message: snippet(&text),
            });
        }

        if let Some(cache) = &self.cache
            && ttl > 0.0
        {
            cache.set(url, body.as_deref(), &headers, &text).await?;
        }

        Ok(text)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&str>,
        options: &FetchOptions,
    ) -> Result<(u16, Vec<(String, String)>, String)> {
        let mut request = self
            .client
            .request(method, url)
            .header(header::USER_AGENT, self.user_agent())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");

        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Some(referer) = &options.referer {
            request = request.header(header::REFERER, referer);
        }
        if let Some(body) = body {
            request = request
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();
        let text = response.text().await?;

        Ok((status, headers, text))
    }
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= 200 {
        trimmed.to_string()
    } else {
        let mut end = 200;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        trimmed[..end].to_string()
    }
}
