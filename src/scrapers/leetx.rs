use super::titles;
use super::traits::SourceScraper;
use crate::fetch::{FetchClient, FetchOptions};
use crate::types::{Quality, Source, Video, VideoType, is_junk_release};
use crate::{Error, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

const LEETX_BASE_URL: &str = "https://1337x.to";
const MAX_RESULTS: usize = 20;

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table.table-list tbody tr").expect("Invalid row selector")
});
static NAME_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td.coll-1 a:nth-child(2)").expect("Invalid name selector")
});
static SEEDS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.coll-2").expect("Invalid seeds selector"));
static SIZE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.coll-4").expect("Invalid size selector"));
static MAGNET_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href^='magnet:']").expect("Invalid magnet selector"));

struct Row {
    title: String,
    detail_path: String,
    seeders: Option<u32>,
    size_bytes: Option<u64>,
}

/// 1337x torrent index scraper.
///
/// Search results point at detail pages; the magnet link needs a second
/// fetch, done lazily through `resolve_link`.
pub struct LeetxScraper {
    client: FetchClient,
    base_url: String,
}

impl LeetxScraper {
    pub fn new(client: FetchClient) -> Self {
        Self::with_base_url(client, LEETX_BASE_URL)
    }

    pub fn with_base_url(client: FetchClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn parse_rows(html: &str) -> Vec<Row> {
        let document = Html::parse_document(html);
        let mut rows = Vec::new();

        for row in document.select(&ROW_SEL) {
            let Some(name) = row.select(&NAME_SEL).next() else {
                continue;
            };
            let title = name.text().collect::<String>().trim().to_string();
            let detail_path = name.value().attr("href").unwrap_or_default().to_string();
            if title.is_empty() || detail_path.is_empty() {
                continue;
            }

            let seeders = row
                .select(&SEEDS_SEL)
                .next()
                .and_then(|cell| cell.text().collect::<String>().trim().parse().ok());
            let size_bytes = row
                .select(&SIZE_SEL)
                .next()
                .and_then(|cell| Source::parse_size(&cell.text().collect::<String>()));

            rows.push(Row {
                title,
                detail_path,
                seeders,
                size_bytes,
            });
        }

        rows
    }
}

#[async_trait]
impl SourceScraper for LeetxScraper {
    fn id(&self) -> &'static str {
        "1337x"
    }

    fn name(&self) -> &'static str {
        "1337x"
    }

    fn supported_types(&self) -> &[VideoType] {
        &[VideoType::Movie, VideoType::Season, VideoType::Episode]
    }

    async fn get_sources(&self, video: &Video) -> Result<Vec<Source>> {
        let url = format!(
            "{}/search/{}/1/",
            self.base_url,
            urlencoding::encode(&video.search_term())
        );

        let html = self.client.get_html(&url, &FetchOptions::new()).await?;

        let sources: Vec<Source> = Self::parse_rows(&html)
            .into_iter()
            .filter(|row| {
                if !titles::title_match(&row.title, video) {
                    debug!(got = %row.title, "1337x result rejected by title check");
                    return false;
                }
                !is_junk_release(&row.title)
            })
            .take(MAX_RESULTS)
            .map(|row| {
                Source::new(
                    format!("{}{}", self.base_url, row.detail_path),
                    "magnet",
                    self.id(),
                )
                .with_quality(Quality::from_release_name(&row.title))
                .with_debrid_only(true)
                .with_size(row.size_bytes)
                .with_seeders(row.seeders)
                .with_release_name(row.title)
            })
            .collect();

        debug!(count = sources.len(), "1337x sources");
        Ok(sources)
    }

    async fn resolve_link(&self, url: &str) -> Result<String> {
        let html = self.client.get_html(url, &FetchOptions::new()).await?;

        let magnet = {
            let document = Html::parse_document(&html);
            document
                .select(&MAGNET_SEL)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
        };

        magnet.ok_or_else(|| Error::NotFound(format!("no magnet link on {url}")))
    }
}
