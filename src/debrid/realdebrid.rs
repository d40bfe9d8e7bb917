use super::{DebridService, DirectLink, is_video_file};
use crate::fetch::ApiClient;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

const RD_BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    filename: String,
    filesize: Option<u64>,
    host: String,
    download: String,
}

#[derive(Debug, Deserialize)]
struct AddMagnetResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    status: String,
    #[serde(default)]
    files: Vec<TorrentFile>,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TorrentFile {
    id: i64,
    path: String,
    bytes: u64,
}

/// RealDebrid client
pub struct RealDebrid {
    client: ApiClient,
    hosts: OnceCell<Vec<String>>,
}

impl RealDebrid {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, RD_BASE_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(base_url).with_bearer(token),
            hosts: OnceCell::new(),
        }
    }

    async fn torrent_info(&self, id: &str) -> Result<TorrentInfo> {
        self.client.get(&format!("/torrents/info/{id}")).await
    }
}

#[async_trait]
impl DebridService for RealDebrid {
    fn id(&self) -> &'static str {
        "realdebrid"
    }

    fn name(&self) -> &'static str {
        "Real-Debrid"
    }

    async fn supported_hosts(&self) -> Result<Vec<String>> {
        self.hosts
            .get_or_try_init(|| async { self.client.get("/hosts/domains").await })
            .await
            .cloned()
    }

    async fn unrestrict(&self, link: &str) -> Result<DirectLink> {
        let response: UnrestrictResponse = self
            .client
            .post_form("/unrestrict/link", &[("link", link)])
            .await?;

        Ok(DirectLink {
            url: response.download,
            filename: response.filename,
            filesize: response.filesize,
            host: response.host,
        })
    }

    /// Magnet flow: add the magnet, select the main video file, and accept
    /// only torrents the service already holds; anything that would start a
    /// real download is removed again.
    async fn unrestrict_magnet(&self, magnet: &str) -> Result<DirectLink> {
        let added: AddMagnetResponse = self
            .client
            .post_form("/torrents/addMagnet", &[("magnet", magnet)])
            .await?;

        let info = self.torrent_info(&added.id).await?;

        if info.status == "waiting_files_selection" {
            let main_file = info
                .files
                .iter()
                .filter(|f| is_video_file(&f.path))
                .max_by_key(|f| f.bytes);

            let Some(file) = main_file else {
                let _ = self.client.delete(&format!("/torrents/delete/{}", added.id)).await;
                return Err(Error::NotFound("no video file in torrent".to_string()));
            };

            self.client
                .post_form::<serde_json::Value>(
                    &format!("/torrents/selectFiles/{}", added.id),
                    &[("files", &file.id.to_string())],
                )
                .await
                .ok();
        }

        let info = self.torrent_info(&added.id).await?;

        if info.status != "downloaded" {
            debug!(status = %info.status, "magnet not cached");
            let _ = self.client.delete(&format!("/torrents/delete/{}", added.id)).await;
            return Err(Error::NotFound(format!(
                "magnet not cached (status: {})",
                info.status
            )));
        }

        let link = info
            .links
            .first()
            .ok_or_else(|| Error::NotFound("cached torrent has no links".to_string()))?;

        self.unrestrict(link).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_unrestrict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/unrestrict/link"))
            .and(header("authorization", "Bearer tok123"))
            .and(body_string_contains("link="))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "id": "X",
                    "filename": "Movie.2024.1080p.mkv",
                    "filesize": 2147483648,
                    "host": "hoster.example",
                    "download": "https://rd.example/dl/abc"
                }"#,
            ))
            .mount(&server)
            .await;

        let rd = RealDebrid::with_base_url("tok123", server.uri());
        let direct = rd.unrestrict("https://hoster.example/f/1").await.unwrap();

        assert_eq!(direct.url, "https://rd.example/dl/abc");
        assert_eq!(direct.filename, "Movie.2024.1080p.mkv");
        assert_eq!(direct.filesize, Some(2_147_483_648));
    }

    #[tokio::test]
    async fn test_supported_hosts_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hosts/domains"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"["hoster.example","other.example"]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rd = RealDebrid::with_base_url("tok", server.uri());

        assert!(rd.supports("hoster.example").await);
        assert!(rd.supports("sub.hoster.example").await);
        assert!(!rd.supports("unknown.example").await);
    }

    #[tokio::test]
    async fn test_magnet_cached_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/torrents/addMagnet"))
            .respond_with(ResponseTemplate::new(201).set_body_string(
                r#"{"id":"TOR1","uri":"https://api/torrents/info/TOR1"}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/torrents/info/TOR1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "status": "downloaded",
                    "files": [{"id": 1, "path": "/Movie.mkv", "bytes": 1000, "selected": 1}],
                    "links": ["https://real-debrid.example/d/xyz"]
                }"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/unrestrict/link"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "filename": "Movie.mkv",
                    "filesize": 1000,
                    "host": "real-debrid.example",
                    "download": "https://rd.example/stream/1"
                }"#,
            ))
            .mount(&server)
            .await;

        let rd = RealDebrid::with_base_url("tok", server.uri());
        let direct = rd
            .unrestrict_magnet("magnet:?xt=urn:btih:abc")
            .await
            .unwrap();

        assert_eq!(direct.url, "https://rd.example/stream/1");
    }

    #[tokio::test]
    async fn test_magnet_not_cached_is_removed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/torrents/addMagnet"))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"TOR2"}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/torrents/info/TOR2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "magnet_conversion", "files": [], "links": []}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/torrents/delete/TOR2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let rd = RealDebrid::with_base_url("tok", server.uri());
        let err = rd
            .unrestrict_magnet("magnet:?xt=urn:btih:abc")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/unrestrict/link"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let rd = RealDebrid::with_base_url("bad", server.uri());
        let err = rd.unrestrict("https://hoster.example/f/1").await.unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
    }
}
