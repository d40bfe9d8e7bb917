use crate::debrid::DebridResolver;
use crate::scrapers::SourceScraper;
use crate::types::{Quality, Source, Video, is_junk_release};
use crate::{Error, Result};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Upper bound on a single scraper's `get_sources` call
    pub scraper_timeout_secs: u64,
    /// Maximum number of sources returned per video
    pub max_sources: usize,
    /// Whether to use the per-scraper result cache
    pub use_cache: bool,
    /// Result cache TTL
    pub cache_ttl_secs: u64,
    /// Sources below this quality are dropped
    pub min_quality: Quality,
    /// Drop cam/telesync class releases
    pub exclude_junk: bool,
    /// Master switch for debrid resolution
    pub debrid_enabled: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            scraper_timeout_secs: 30,
            max_sources: 100,
            use_cache: true,
            cache_ttl_secs: 600,
            min_quality: Quality::Low,
            exclude_junk: true,
            debrid_enabled: true,
        }
    }
}

/// Fans a video request out across all scrapers and merges the results.
///
/// One task per scraper with a per-scraper timeout; a failing or slow site
/// contributes nothing and never fails the aggregate.
pub struct SourceAggregator {
    scrapers: Vec<Arc<dyn SourceScraper>>,
    cache: Cache<String, Arc<Vec<Source>>>,
    config: AggregatorConfig,
    debrid: Option<DebridResolver>,
}

impl SourceAggregator {
    /// Create an aggregator with default configuration
    pub fn new() -> Self {
        Self::with_config(AggregatorConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: AggregatorConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs.max(1)))
            .build();

        Self {
            scrapers: Vec::new(),
            cache,
            config,
            debrid: None,
        }
    }

    /// Add a scraper
    pub fn add_scraper<S: SourceScraper + 'static>(&mut self, scraper: S) {
        self.scrapers.push(Arc::new(scraper));
    }

    /// Get all scrapers
    pub fn scrapers(&self) -> &[Arc<dyn SourceScraper>] {
        &self.scrapers
    }

    /// Attach a debrid resolver chain
    pub fn set_debrid(&mut self, resolver: DebridResolver) {
        self.debrid = Some(resolver);
    }

    /// Collect, dedupe, filter and rank sources for a video.
    ///
    /// Every scraper failing yields an empty list, not an error; "no
    /// sources" is a normal outcome upstream.
    pub async fn get_sources(&self, video: &Video) -> Vec<Source> {
        info!(title = %video.title, kind = %video.video_type, "aggregating sources");

        let mut all_sources: Vec<Source> = Vec::new();
        let mut pending = Vec::new();

        for scraper in &self.scrapers {
            if !scraper.enabled() || !scraper.supports(video) {
                continue;
            }

            let cache_key = format!("{}:{}", scraper.id(), video.cache_key());

            if self.config.use_cache
                && let Some(cached) = self.cache.get(&cache_key).await
            {
                debug!(scraper = scraper.id(), "source cache hit");
                all_sources.extend((*cached).clone());
                continue;
            }

            let limit =
                Duration::from_secs(self.config.scraper_timeout_secs).min(scraper.timeout());
            let task_scraper = Arc::clone(scraper);
            let task_video = video.clone();

            pending.push((
                scraper.id(),
                cache_key,
                tokio::spawn(async move {
                    timeout(limit, task_scraper.get_sources(&task_video)).await
                }),
            ));
        }

        let finished = futures::future::join_all(
            pending
                .into_iter()
                .map(|(id, key, handle)| async move { (id, key, handle.await) }),
        )
        .await;

        for (id, cache_key, joined) in finished {
            match joined {
                Ok(Ok(Ok(sources))) => {
                    debug!(scraper = id, count = sources.len(), "scraper finished");
                    if self.config.use_cache {
                        self.cache.insert(cache_key, Arc::new(sources.clone())).await;
                    }
                    all_sources.extend(sources);
                }
                Ok(Ok(Err(e))) => debug!(scraper = id, "scraper failed: {e}"),
                Ok(Err(_)) => warn!(scraper = id, "scraper timed out"),
                Err(e) => warn!(scraper = id, "scraper task aborted: {e}"),
            }
        }

        self.finalize(all_sources)
    }

    fn finalize(&self, sources: Vec<Source>) -> Vec<Source> {
        let debrid_available = self.config.debrid_enabled
            && self.debrid.as_ref().is_some_and(|d| !d.is_empty());

        let mut seen = HashSet::new();
        let mut kept: Vec<Source> = sources
            .into_iter()
            .filter(|s| !s.url.trim().is_empty())
            .filter(|s| seen.insert(s.dedupe_key()))
            .filter(|s| s.quality >= self.config.min_quality)
            .filter(|s| {
                !self.config.exclude_junk
                    || s.release_name.as_deref().is_none_or(|n| !is_junk_release(n))
            })
            .filter(|s| !s.debrid_only || debrid_available)
            .collect();

        kept.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        kept.truncate(self.config.max_sources);

        info!(count = kept.len(), "sources after merge");
        kept
    }

    /// Resolve a source to its final playable URL.
    ///
    /// Dispatches `resolve_link` to the owning scraper, then hands
    /// non-direct links to the debrid chain when one is configured.
    pub async fn resolve(&self, source: &Source) -> Result<String> {
        let scraper = self
            .scrapers
            .iter()
            .find(|s| s.id() == source.scraper)
            .ok_or_else(|| Error::Unsupported(format!("unknown scraper: {}", source.scraper)))?;

        let link = scraper.resolve_link(&source.url).await?;

        if source.direct {
            return Ok(link);
        }

        if self.config.debrid_enabled
            && let Some(debrid) = &self.debrid
            && !debrid.is_empty()
        {
            return debrid.resolve(&link, &source.host).await;
        }

        if source.debrid_only {
            return Err(Error::Unsupported(
                "source requires a debrid service".to_string(),
            ));
        }

        Ok(link)
    }

    /// Clear the result cache
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for SourceAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticScraper {
        id: &'static str,
        sources: Vec<Source>,
        fail: bool,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
    }

    impl StaticScraper {
        fn new(id: &'static str, sources: Vec<Source>) -> Self {
            Self {
                id,
                sources,
                fail: false,
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(id: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(id, Vec::new())
            }
        }

        fn slow(id: &'static str, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::new(id, vec![Source::new("http://slow/1", "slow.com", id)])
            }
        }
    }

    #[async_trait]
    impl SourceScraper for StaticScraper {
        fn id(&self) -> &'static str {
            self.id
        }

        fn name(&self) -> &'static str {
            self.id
        }

        fn supported_types(&self) -> &[VideoType] {
            &[VideoType::Movie, VideoType::Episode]
        }

        async fn get_sources(&self, _video: &Video) -> Result<Vec<Source>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::Parse("broken page".to_string()));
            }
            Ok(self.sources.clone())
        }
    }

    fn http_source(url: &str, scraper: &str, quality: Quality) -> Source {
        Source::new(url, "hoster.example", scraper)
            .with_quality(quality)
            .with_direct(true)
    }

    #[tokio::test]
    async fn test_fan_out_merges_and_sorts() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::new(
            "a",
            vec![http_source("http://a/sd", "a", Quality::Sd)],
        ));
        aggregator.add_scraper(StaticScraper::new(
            "b",
            vec![http_source("http://b/hd", "b", Quality::Hd1080)],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].quality, Quality::Hd1080);
        assert_eq!(sources[1].quality, Quality::Sd);
    }

    #[tokio::test]
    async fn test_failing_scraper_does_not_fail_aggregate() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::failing("bad"));
        aggregator.add_scraper(StaticScraper::new(
            "good",
            vec![http_source("http://good/1", "good", Quality::Hd720)],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].scraper, "good");
    }

    #[tokio::test]
    async fn test_all_failing_yields_empty() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::failing("bad1"));
        aggregator.add_scraper(StaticScraper::failing("bad2"));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_slow_scraper_times_out() {
        let mut aggregator = SourceAggregator::with_config(AggregatorConfig {
            scraper_timeout_secs: 1,
            ..AggregatorConfig::default()
        });
        aggregator.add_scraper(StaticScraper::slow("slow", Duration::from_secs(10)));
        aggregator.add_scraper(StaticScraper::new(
            "fast",
            vec![http_source("http://fast/1", "fast", Quality::Sd)],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].scraper, "fast");
    }

    #[tokio::test]
    async fn test_dedupe_by_url() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::new(
            "a",
            vec![http_source("http://same/1", "a", Quality::Hd720)],
        ));
        aggregator.add_scraper(StaticScraper::new(
            "b",
            vec![http_source("http://same/1", "b", Quality::Hd720)],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;
        assert_eq!(sources.len(), 1);
    }

    #[tokio::test]
    async fn test_min_quality_filter() {
        let mut aggregator = SourceAggregator::with_config(AggregatorConfig {
            min_quality: Quality::Hd720,
            ..AggregatorConfig::default()
        });
        aggregator.add_scraper(StaticScraper::new(
            "a",
            vec![
                http_source("http://a/sd", "a", Quality::Sd),
                http_source("http://a/hd", "a", Quality::Hd1080),
            ],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].quality, Quality::Hd1080);
    }

    #[tokio::test]
    async fn test_junk_release_filtered() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::new(
            "a",
            vec![
                http_source("http://a/cam", "a", Quality::Low)
                    .with_release_name("Movie.2024.HDCAM.x264"),
                http_source("http://a/ok", "a", Quality::Hd720)
                    .with_release_name("Movie.2024.720p.WEB-DL"),
            ],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;

        assert_eq!(sources.len(), 1);
        assert!(sources[0].url.ends_with("/ok"));
    }

    #[tokio::test]
    async fn test_debrid_only_dropped_without_debrid() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::new(
            "a",
            vec![
                http_source("http://a/direct", "a", Quality::Sd),
                Source::new("magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567", "magnet", "a")
                    .with_quality(Quality::Hd1080)
                    .with_debrid_only(true),
            ],
        ));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;

        assert_eq!(sources.len(), 1);
        assert!(!sources[0].debrid_only);
    }

    #[tokio::test]
    async fn test_result_cache_prevents_second_call() {
        let scraper = StaticScraper::new(
            "counted",
            vec![http_source("http://c/1", "counted", Quality::Sd)],
        );
        let calls = Arc::clone(&scraper.calls);

        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(scraper);

        let video = Video::movie("X", Some(2000));
        aggregator.get_sources(&video).await;
        aggregator.get_sources(&video).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_disabled_refetches() {
        let scraper = StaticScraper::new("counted", Vec::new());
        let calls = Arc::clone(&scraper.calls);

        let mut aggregator = SourceAggregator::with_config(AggregatorConfig {
            use_cache: false,
            ..AggregatorConfig::default()
        });
        aggregator.add_scraper(scraper);

        let video = Video::movie("X", Some(2000));
        aggregator.get_sources(&video).await;
        aggregator.get_sources(&video).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_max_sources_truncation() {
        let many: Vec<Source> = (0..20)
            .map(|i| http_source(&format!("http://a/{i}"), "a", Quality::Sd))
            .collect();

        let mut aggregator = SourceAggregator::with_config(AggregatorConfig {
            max_sources: 5,
            ..AggregatorConfig::default()
        });
        aggregator.add_scraper(StaticScraper::new("a", many));

        let sources = aggregator.get_sources(&Video::movie("X", None)).await;
        assert_eq!(sources.len(), 5);
    }

    #[tokio::test]
    async fn test_resolve_direct_source() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::new("a", Vec::new()));

        let source = http_source("http://a/watch", "a", Quality::Sd);
        let resolved = aggregator.resolve(&source).await.unwrap();

        assert_eq!(resolved, "http://a/watch");
    }

    #[tokio::test]
    async fn test_resolve_unknown_scraper_fails() {
        let aggregator = SourceAggregator::new();
        let source = http_source("http://a/watch", "ghost", Quality::Sd);

        let err = aggregator.resolve(&source).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_resolve_debrid_only_without_debrid_fails() {
        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(StaticScraper::new("a", Vec::new()));

        let source = Source::new("magnet:?xt=urn:btih:aa", "magnet", "a").with_debrid_only(true);
        let err = aggregator.resolve(&source).await.unwrap_err();

        assert!(matches!(err, Error::Unsupported(_)));
    }
}
