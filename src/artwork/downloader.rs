use super::Artwork;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Downloader for artwork assets
pub struct Downloader;

impl Downloader {
    /// Download an image from a URL to a specific path
    pub async fn download_image(url: &str, output_path: &Path) -> Result<()> {
        if url.is_empty() {
            return Ok(());
        }

        let response = reqwest::get(url).await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to download image: {}",
                response.status()
            ));
        }

        let bytes = response.bytes().await?;

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(output_path).await?;
        file.write_all(&bytes).await?;

        Ok(())
    }

    /// Download every set image in an artwork set into a directory,
    /// named by slot (`poster.jpg`, `fanart.jpg`, ...). Returns the
    /// paths written.
    pub async fn download_set(artwork: &Artwork, dir: &Path) -> Result<Vec<PathBuf>> {
        let slots = [
            ("poster", &artwork.poster),
            ("fanart", &artwork.fanart),
            ("banner", &artwork.banner),
            ("thumb", &artwork.thumb),
            ("clearlogo", &artwork.clearlogo),
        ];

        let mut written = Vec::new();
        for (slot, url) in slots {
            if let Some(url) = url {
                let ext = extension_for(url);
                let path = dir.join(format!("{slot}.{ext}"));
                Self::download_image(url, &path).await?;
                written.push(path);
            }
        }

        Ok(written)
    }
}

fn extension_for(url: &str) -> &'static str {
    let trimmed = url.split('?').next().unwrap_or(url);
    if trimmed.ends_with(".png") {
        "png"
    } else {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poster.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("art").join("poster.jpg");

        Downloader::download_image(&format!("{}/poster.jpg", server.uri()), &out)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"jpegdata");
    }

    #[tokio::test]
    async fn test_download_set_skips_unset_slots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"p".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"l".to_vec()))
            .mount(&server)
            .await;

        let artwork = Artwork {
            poster: Some(format!("{}/p.jpg", server.uri())),
            clearlogo: Some(format!("{}/logo.png", server.uri())),
            ..Default::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let written = Downloader::download_set(&artwork, dir.path()).await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(dir.path().join("poster.jpg").exists());
        assert!(dir.path().join("clearlogo.png").exists());
        assert!(!dir.path().join("fanart.jpg").exists());
    }

    #[tokio::test]
    async fn test_download_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("x.jpg");

        let result =
            Downloader::download_image(&format!("{}/missing.jpg", server.uri()), &out).await;

        assert!(result.is_err());
    }
}
