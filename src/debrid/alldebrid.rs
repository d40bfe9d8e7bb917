use super::{DebridService, DirectLink};
use crate::fetch::ApiClient;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

const AD_BASE_URL: &str = "https://api.alldebrid.com/v4";
const AD_AGENT: &str = "bifrost";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    error: Option<AdError>,
}

#[derive(Debug, Deserialize)]
struct AdError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct HostsData {
    #[serde(default)]
    hosts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UnlockData {
    link: String,
    filename: String,
    filesize: Option<u64>,
    host: String,
}

/// AllDebrid client. No magnet support; the resolver chain falls through
/// to a service that has it.
pub struct AllDebrid {
    client: ApiClient,
    api_key: String,
    hosts: OnceCell<Vec<String>>,
}

impl AllDebrid {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, AD_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(base_url),
            api_key: api_key.into(),
            hosts: OnceCell::new(),
        }
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T> {
        if envelope.status != "success" {
            return Err(Error::Api {
                status: 200,
                message: envelope
                    .error
                    .map_or_else(|| "alldebrid error".to_string(), |e| e.message),
            });
        }
        envelope
            .data
            .ok_or_else(|| Error::Parse("no data in alldebrid response".to_string()))
    }
}

#[async_trait]
impl DebridService for AllDebrid {
    fn id(&self) -> &'static str {
        "alldebrid"
    }

    fn name(&self) -> &'static str {
        "AllDebrid"
    }

    async fn supported_hosts(&self) -> Result<Vec<String>> {
        self.hosts
            .get_or_try_init(|| async {
                let envelope: Envelope<HostsData> = self
                    .client
                    .get_with_params(
                        "/hosts/domains",
                        &[("agent", AD_AGENT), ("apikey", &self.api_key)],
                    )
                    .await?;
                Ok(Self::unwrap_envelope(envelope)?.hosts)
            })
            .await
            .cloned()
    }

    async fn unrestrict(&self, link: &str) -> Result<DirectLink> {
        let envelope: Envelope<UnlockData> = self
            .client
            .get_with_params(
                "/link/unlock",
                &[("agent", AD_AGENT), ("apikey", &self.api_key), ("link", link)],
            )
            .await?;

        let data = Self::unwrap_envelope(envelope)?;

        Ok(DirectLink {
            url: data.link,
            filename: data.filename,
            filesize: data.filesize,
            host: data.host,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_unlock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/link/unlock"))
            .and(query_param("apikey", "key9"))
            .and(query_param("agent", "bifrost"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "status": "success",
                    "data": {
                        "link": "https://ad.example/dl/1",
                        "filename": "Show.S01E01.mkv",
                        "filesize": 900,
                        "host": "hoster.example"
                    }
                }"#,
            ))
            .mount(&server)
            .await;

        let ad = AllDebrid::with_base_url("key9", server.uri());
        let direct = ad.unrestrict("https://hoster.example/f/2").await.unwrap();

        assert_eq!(direct.url, "https://ad.example/dl/1");
        assert_eq!(direct.filename, "Show.S01E01.mkv");
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/link/unlock"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "error", "error": {"code": "LINK_DOWN", "message": "link is down"}}"#,
            ))
            .mount(&server)
            .await;

        let ad = AllDebrid::with_base_url("key9", server.uri());
        let err = ad.unrestrict("https://x/f").await.unwrap_err();

        match err {
            Error::Api { message, .. } => assert_eq!(message, "link is down"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_magnets_unsupported() {
        let ad = AllDebrid::with_base_url("key9", "http://127.0.0.1:1");
        let err = ad.unrestrict_magnet("magnet:?xt=urn:btih:abc").await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_hosts_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hosts/domains"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status": "success", "data": {"hosts": ["hoster.example"]}}"#,
            ))
            .mount(&server)
            .await;

        let ad = AllDebrid::with_base_url("key9", server.uri());
        assert!(ad.supports("hoster.example").await);
        assert!(!ad.supports("nope.example").await);
    }
}
