mod alldebrid;
mod premiumize;
mod realdebrid;

pub use alldebrid::AllDebrid;
pub use premiumize::Premiumize;
pub use realdebrid::RealDebrid;

use crate::config::DebridSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// A link unrestricted into a plain HTTP stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectLink {
    pub url: String,
    pub filename: String,
    pub filesize: Option<u64>,
    pub host: String,
}

/// A premium unlocking service that converts hoster/torrent links into
/// direct HTTP streams
#[async_trait]
pub trait DebridService: Send + Sync {
    /// Service identifier (e.g., "realdebrid")
    fn id(&self) -> &'static str;

    /// Human-readable service name
    fn name(&self) -> &'static str;

    /// Hoster domains this account can unrestrict; fetched once and cached
    async fn supported_hosts(&self) -> Result<Vec<String>>;

    /// Whether a hoster domain is covered
    async fn supports(&self, host: &str) -> bool {
        match self.supported_hosts().await {
            Ok(hosts) => hosts
                .iter()
                .any(|h| host == h || host.ends_with(&format!(".{h}"))),
            Err(e) => {
                debug!(service = self.id(), "host list unavailable: {e}");
                false
            }
        }
    }

    /// Convert a hoster link into a direct stream
    async fn unrestrict(&self, link: &str) -> Result<DirectLink>;

    /// Convert a magnet link into a direct stream, where the service keeps
    /// cached torrents
    async fn unrestrict_magnet(&self, _magnet: &str) -> Result<DirectLink> {
        Err(Error::Unsupported(format!(
            "{} cannot unrestrict magnets",
            self.id()
        )))
    }
}

/// Ordered chain of configured debrid services; the first one that claims
/// a link wins, failures fall through to the next
#[derive(Clone, Default)]
pub struct DebridResolver {
    services: Vec<Arc<dyn DebridService>>,
}

impl DebridResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from configured credentials, in fixed order:
    /// RealDebrid, Premiumize, AllDebrid
    pub fn from_settings(settings: &DebridSettings) -> Self {
        let mut resolver = Self::new();

        if let Some(ref token) = settings.realdebrid_token {
            resolver.add_service(RealDebrid::new(token));
        }
        if let Some(ref key) = settings.premiumize_api_key {
            resolver.add_service(Premiumize::new(key));
        }
        if let Some(ref key) = settings.alldebrid_api_key {
            resolver.add_service(AllDebrid::new(key));
        }

        resolver
    }

    pub fn add_service<S: DebridService + 'static>(&mut self, service: S) {
        self.services.push(Arc::new(service));
    }

    pub fn services(&self) -> &[Arc<dyn DebridService>] {
        &self.services
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Resolve a link through the first service that can take it
    pub async fn resolve(&self, link: &str, host: &str) -> Result<String> {
        if self.services.is_empty() {
            return Err(Error::Unsupported("no debrid service configured".to_string()));
        }

        let is_magnet = link.starts_with("magnet:");

        for service in &self.services {
            let attempt = if is_magnet {
                service.unrestrict_magnet(link).await
            } else if service.supports(host).await {
                service.unrestrict(link).await
            } else {
                continue;
            };

            match attempt {
                Ok(direct) => {
                    debug!(service = service.id(), file = %direct.filename, "unrestricted");
                    return Ok(direct.url);
                }
                Err(e) => {
                    warn!(service = service.id(), "unrestrict failed: {e}");
                }
            }
        }

        Err(Error::Unsupported(format!(
            "no debrid service could resolve host {host}"
        )))
    }
}

/// File extensions worth streaming; used to pick the main file out of a
/// torrent's file list
pub(crate) fn is_video_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    [".mkv", ".mp4", ".avi", ".m4v", ".mov", ".wmv", ".ts"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
