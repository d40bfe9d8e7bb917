pub(crate) mod patterns;
pub(crate) mod titles;

mod leetx;
mod torrentio;
mod traits;
mod yts;

pub use leetx::LeetxScraper;
pub use torrentio::TorrentioScraper;
pub use traits::SourceScraper;
pub use yts::YtsScraper;

use once_cell::sync::Lazy;

/// Trackers appended when building magnet links from bare info hashes
pub(crate) static MAGNET_TRACKERS: &[&str] = &[
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:80",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://p4p.arenabg.com:1337",
    "udp://tracker.leechers-paradise.org:6969",
];

/// Build a magnet link from an info hash and display name
pub(crate) fn hash_to_magnet(info_hash: &str, name: &str) -> String {
    static TRACKER_SUFFIX: Lazy<String> = Lazy::new(|| {
        MAGNET_TRACKERS
            .iter()
            .map(|t| format!("&tr={}", urlencoding::encode(t)))
            .collect()
    });

    format!(
        "magnet:?xt=urn:btih:{}&dn={}{}",
        info_hash.to_lowercase(),
        urlencoding::encode(name),
        &*TRACKER_SUFFIX
    )
}
