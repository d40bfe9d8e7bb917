use super::{DebridService, DirectLink, is_video_file};
use crate::fetch::ApiClient;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

const PM_BASE_URL: &str = "https://www.premiumize.me/api";

#[derive(Debug, Deserialize)]
struct ServicesResponse {
    #[serde(default)]
    directdl: Vec<String>,
    #[serde(default)]
    cache: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DirectDlResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    content: Vec<DirectDlFile>,
}

#[derive(Debug, Deserialize)]
struct DirectDlFile {
    path: String,
    size: Option<u64>,
    link: String,
    stream_link: Option<String>,
}

/// Premiumize client; one `directdl` endpoint covers both hoster links and
/// cached magnets
pub struct Premiumize {
    client: ApiClient,
    api_key: String,
    hosts: OnceCell<Vec<String>>,
}

impl Premiumize {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, PM_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(base_url),
            api_key: api_key.into(),
            hosts: OnceCell::new(),
        }
    }

    async fn direct_download(&self, src: &str) -> Result<DirectLink> {
        let response: DirectDlResponse = self
            .client
            .post_form(
                &format!("/transfer/directdl?apikey={}", self.api_key),
                &[("src", src)],
            )
            .await?;

        if response.status != "success" {
            return Err(Error::Api {
                status: 200,
                message: response
                    .message
                    .unwrap_or_else(|| "premiumize directdl failed".to_string()),
            });
        }

        let file = response
            .content
            .into_iter()
            .filter(|f| is_video_file(&f.path))
            .max_by_key(|f| f.size.unwrap_or(0))
            .ok_or_else(|| Error::NotFound("no video file in transfer".to_string()))?;

        Ok(DirectLink {
            url: file.stream_link.unwrap_or(file.link),
            filename: file
                .path
                .rsplit('/')
                .next()
                .unwrap_or(&file.path)
                .to_string(),
            filesize: file.size,
            host: "premiumize".to_string(),
        })
    }
}

#[async_trait]
impl DebridService for Premiumize {
    fn id(&self) -> &'static str {
        "premiumize"
    }

    fn name(&self) -> &'static str {
        "Premiumize"
    }

    async fn supported_hosts(&self) -> Result<Vec<String>> {
        self.hosts
            .get_or_try_init(|| async {
                let response: ServicesResponse = self
                    .client
                    .get_with_params("/services/list", &[("apikey", &self.api_key)])
                    .await?;

                let mut hosts = response.directdl;
                hosts.extend(response.cache);
                hosts.sort();
                hosts.dedup();
                Ok(hosts)
            })
            .await
            .cloned()
    }

    async fn unrestrict(&self, link: &str) -> Result<DirectLink> {
        self.direct_download(link).await
    }

    async fn unrestrict_magnet(&self, magnet: &str) -> Result<DirectLink> {
        self.direct_download(magnet).await
    }
}
