//! Cross-module integration tests

use crate::config::FetchSettings;
use crate::debrid::{DebridResolver, DebridService, DirectLink};
use crate::fetch::{FetchClient, ResponseCache};
use crate::scrapers::{LeetxScraper, YtsScraper};
use crate::types::{Quality, Source, Video};
use crate::{Error, Result, SourceAggregator};
use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Debrid stub that accepts any magnet and nothing else
struct CachedMagnetDebrid;

#[async_trait]
impl DebridService for CachedMagnetDebrid {
    fn id(&self) -> &'static str {
        "stub-debrid"
    }

    fn name(&self) -> &'static str {
        "Stub Debrid"
    }

    async fn supported_hosts(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn unrestrict(&self, _link: &str) -> Result<DirectLink> {
        Err(Error::Unsupported("hoster links unsupported".to_string()))
    }

    async fn unrestrict_magnet(&self, magnet: &str) -> Result<DirectLink> {
        let hash = Source::new(magnet, "magnet", "stub")
            .info_hash()
            .unwrap_or_default();
        Ok(DirectLink {
            url: format!("https://debrid.example/stream/{hash}"),
            filename: "stream.mkv".to_string(),
            filesize: None,
            host: "debrid.example".to_string(),
        })
    }
}

const YTS_FIXTURE: &str = r#"{
    "status": "ok",
    "data": {
        "movie_count": 1,
        "movies": [{
            "title": "The Matrix",
            "title_long": "The Matrix (1999)",
            "year": 1999,
            "torrents": [
                {"hash": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA1",
                 "quality": "1080p", "type": "bluray", "seeds": 120, "size_bytes": 2147483648},
                {"hash": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2",
                 "quality": "720p", "type": "web", "seeds": 55, "size_bytes": 1073741824}
            ]
        }]
    }
}"#;

const LEETX_SEARCH: &str = r#"<html><body><table class="table-list"><tbody>
<tr>
  <td class="coll-1 name">
    <a href="/sub/10/0/" class="icon"></a>
    <a href="/torrent/101/The-Matrix-1999/">The.Matrix.1999.1080p.BluRay.x264-GROUP</a>
  </td>
  <td class="coll-2 seeds">120</td>
  <td class="coll-3 leeches">30</td>
  <td class="coll-4 size">2.1 GB</td>
</tr>
</tbody></table></body></html>"#;

const LEETX_DETAIL: &str = r#"<html><body>
<a href="magnet:?xt=urn:btih:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb1&dn=The.Matrix">Magnet</a>
</body></html>"#;

async fn shared_client(dir: &std::path::Path) -> FetchClient {
    let cache = ResponseCache::in_memory().await.unwrap();
    FetchClient::with_cache(
        &FetchSettings {
            cookie_jar: dir.join("cookies.json"),
            cache_db: dir.join("responses.db"),
            ..FetchSettings::default()
        },
        cache,
    )
    .unwrap()
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    async fn build_aggregator(
        yts: &MockServer,
        leetx: &MockServer,
        dir: &std::path::Path,
    ) -> SourceAggregator {
        let client = shared_client(dir).await;

        let mut resolver = DebridResolver::new();
        resolver.add_service(CachedMagnetDebrid);

        let mut aggregator = SourceAggregator::new();
        aggregator.add_scraper(YtsScraper::with_base_url(client.clone(), yts.uri()));
        aggregator.add_scraper(LeetxScraper::with_base_url(client.clone(), leetx.uri()));
        aggregator.set_debrid(resolver);
        aggregator
    }

    #[tokio::test]
    async fn test_sources_merged_across_scrapers() {
        let yts = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/list_movies.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(YTS_FIXTURE))
            .mount(&yts)
            .await;

        let leetx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/The%20Matrix%201999/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LEETX_SEARCH))
            .mount(&leetx)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let aggregator = build_aggregator(&yts, &leetx, dir.path()).await;

        let video = Video::movie("The Matrix", Some(1999)).with_imdb_id("tt0133093");
        let sources = aggregator.get_sources(&video).await;

        assert_eq!(sources.len(), 3);
        // Quality first; the tie between 1080p sources breaks on size
        assert_eq!(sources[0].quality, Quality::Hd1080);
        assert_eq!(sources[0].scraper, "1337x");
        assert_eq!(sources[1].scraper, "yts");
        assert_eq!(sources[2].quality, Quality::Hd720);
    }

    #[tokio::test]
    async fn test_resolve_through_scraper_and_debrid() {
        let yts = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/list_movies.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(YTS_FIXTURE))
            .mount(&yts)
            .await;

        let leetx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/The%20Matrix%201999/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LEETX_SEARCH))
            .mount(&leetx)
            .await;
        Mock::given(method("GET"))
            .and(path("/torrent/101/The-Matrix-1999/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LEETX_DETAIL))
            .mount(&leetx)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let aggregator = build_aggregator(&yts, &leetx, dir.path()).await;

        let video = Video::movie("The Matrix", Some(1999)).with_imdb_id("tt0133093");
        let sources = aggregator.get_sources(&video).await;

        let leetx_source = sources.iter().find(|s| s.scraper == "1337x").unwrap();
        let playable = aggregator.resolve(leetx_source).await.unwrap();

        assert_eq!(
            playable,
            "https://debrid.example/stream/bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb1"
        );
    }

    #[tokio::test]
    async fn test_one_dead_site_degrades_gracefully() {
        let yts = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/list_movies.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(YTS_FIXTURE))
            .mount(&yts)
            .await;

        let leetx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/The%20Matrix%201999/1/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("site is down"))
            .mount(&leetx)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let aggregator = build_aggregator(&yts, &leetx, dir.path()).await;

        let video = Video::movie("The Matrix", Some(1999)).with_imdb_id("tt0133093");
        let sources = aggregator.get_sources(&video).await;

        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|s| s.scraper == "yts"));
    }
}

#[cfg(test)]
mod wiring_tests {
    use super::*;
    use crate::Settings;

    #[tokio::test]
    async fn test_default_aggregator_wiring() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.fetch.cookie_jar = dir.path().join("cookies.json");
        settings.fetch.cache_db = dir.path().join("responses.db");

        let aggregator = crate::create_default_aggregator(&settings).await.unwrap();
        let ids: Vec<&str> = aggregator.scrapers().iter().map(|s| s.id()).collect();

        assert_eq!(ids, vec!["yts", "torrentio", "1337x"]);
    }

    #[tokio::test]
    async fn test_disabled_scraper_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.fetch.cookie_jar = dir.path().join("cookies.json");
        settings.fetch.cache_db = dir.path().join("responses.db");
        settings.scrapers.disabled = vec!["torrentio".to_string()];

        let aggregator = crate::create_default_aggregator(&settings).await.unwrap();
        let ids: Vec<&str> = aggregator.scrapers().iter().map(|s| s.id()).collect();

        assert_eq!(ids, vec!["yts", "1337x"]);
    }

    #[test]
    fn test_artwork_service_wiring() {
        let mut settings = Settings::default();
        settings.artwork.tmdb_api_key = Some("k".to_string());
        settings.artwork.fanart_api_key = Some("fk".to_string());

        let service = crate::create_artwork_service(&settings);
        let ids: Vec<&str> = service.providers().iter().map(|p| p.id()).collect();

        // fanart.tv outranks tmdb
        assert_eq!(ids, vec!["fanart.tv", "tmdb"]);
    }
}
