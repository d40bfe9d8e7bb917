use super::Quality;
use crate::scrapers::patterns::PATTERNS;
use serde::{Deserialize, Serialize};

/// One candidate playable link plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Playable or resolvable URL (http(s) or magnet)
    pub url: String,
    /// Hoster domain, or "magnet" for torrents
    pub host: String,
    /// Guessed or declared quality
    pub quality: Quality,
    /// True when the URL plays without further resolution
    pub direct: bool,
    /// True when the link is only usable through a debrid service
    pub debrid_only: bool,
    /// ID of the scraper that produced this source
    pub scraper: String,
    /// Reported file size in bytes
    pub size_bytes: Option<u64>,
    /// Reported seeders (torrent sources)
    pub seeders: Option<u32>,
    /// Raw release name, when the site exposes one
    pub release_name: Option<String>,
}

impl Source {
    /// Create a new source with required fields
    pub fn new(
        url: impl Into<String>,
        host: impl Into<String>,
        scraper: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            host: host.into(),
            quality: Quality::default(),
            direct: false,
            debrid_only: false,
            scraper: scraper.into(),
            size_bytes: None,
            seeders: None,
            release_name: None,
        }
    }

    /// Builder pattern: set quality
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Builder pattern: mark as directly playable
    pub fn with_direct(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }

    /// Builder pattern: mark as debrid-only
    pub fn with_debrid_only(mut self, debrid_only: bool) -> Self {
        self.debrid_only = debrid_only;
        self
    }

    /// Builder pattern: set size in bytes
    pub fn with_size(mut self, size_bytes: Option<u64>) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Builder pattern: set seeders
    pub fn with_seeders(mut self, seeders: Option<u32>) -> Self {
        self.seeders = seeders;
        self
    }

    /// Builder pattern: set release name
    pub fn with_release_name(mut self, name: impl Into<String>) -> Self {
        self.release_name = Some(name.into());
        self
    }

    pub fn is_magnet(&self) -> bool {
        self.url.starts_with("magnet:")
    }

    /// BitTorrent info hash, for magnet links
    pub fn info_hash(&self) -> Option<String> {
        PATTERNS
            .info_hash
            .captures(&self.url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
    }

    /// Identity used for deduplication: info hash for magnets, URL otherwise
    pub fn dedupe_key(&self) -> String {
        self.info_hash()
            .unwrap_or_else(|| self.url.trim().to_string())
    }

    /// Ordering key: quality, then seeders, then size, all descending
    pub fn sort_key(&self) -> (Quality, u32, u64) {
        (
            self.quality,
            self.seeders.unwrap_or(0),
            self.size_bytes.unwrap_or(0),
        )
    }

    /// Parse a human-readable size ("1.4 GB", "700MB") into bytes
    pub fn parse_size(text: &str) -> Option<u64> {
        let caps = PATTERNS.size.captures(text)?;
        let num: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
        let multiplier: u64 = match caps.get(2)?.as_str().to_uppercase().as_str() {
            "B" => 1,
            "KB" | "KIB" => 1024,
            "MB" | "MIB" => 1024 * 1024,
            "GB" | "GIB" => 1024 * 1024 * 1024,
            "TB" | "TIB" => 1024u64.pow(4),
            _ => return None,
        };
        Some((num * multiplier as f64) as u64)
    }

    /// Parse a seeder count out of free-form text ("Seeders: 120", "👤 34")
    pub fn parse_seeders(text: &str) -> Option<u32> {
        PATTERNS
            .seeders
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
