//! Fetching the raw dataset.

use crate::errors::{DownloadError, PipelineError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Source of raw dataset bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches the resource at `url`.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the resource cannot be fetched.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Downloads over HTTP(S) with `reqwest`; `file://` URLs are read locally.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Creates a downloader with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("visaprep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DownloadError::new("", format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        if let Some(local) = url.strip_prefix("file://") {
            return tokio::fs::read(local)
                .await
                .map_err(|e| DownloadError::new(url, e.to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::new(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::new(url, format!("HTTP status {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::new(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// The last path segment of a URL, ignoring any query or fragment.
#[must_use]
pub fn url_basename(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Downloads `url` into `destination_dir/<basename(url)>`.
///
/// # Errors
///
/// Returns `DownloadError` if the URL has no file name or cannot be fetched,
/// and `PipelineError::Io` if the file cannot be written.
pub async fn download(
    downloader: &dyn Downloader,
    url: &str,
    destination_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let file_name =
        url_basename(url).ok_or_else(|| DownloadError::new(url, "URL has no file name"))?;

    tokio::fs::create_dir_all(destination_dir)
        .await
        .map_err(|e| PipelineError::io(destination_dir, e))?;
    let raw_file_path = destination_dir.join(file_name);

    info!(url, destination = %raw_file_path.display(), "Downloading dataset");
    let bytes = downloader.fetch(url).await?;
    tokio::fs::write(&raw_file_path, &bytes)
        .await
        .map_err(|e| PipelineError::io(&raw_file_path, e))?;
    info!(bytes = bytes.len(), path = %raw_file_path.display(), "Dataset downloaded");

    Ok(raw_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("https://x.org/data/Visadataset.csv"), Some("Visadataset.csv"));
        assert_eq!(url_basename("https://x.org/a.csv?raw=true"), Some("a.csv"));
        assert_eq!(url_basename("https://x.org/data/"), None);
    }

    #[tokio::test]
    async fn test_download_writes_basename() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockDownloader::new();
        mock.expect_fetch()
            .withf(|url| url.to_string() == "https://x.org/data/Visadataset.csv")
            .times(1)
            .returning(|_| Ok(b"a,b\n1,2\n".to_vec()));

        let path = download(&mock, "https://x.org/data/Visadataset.csv", &dir.path().join("raw"))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("raw/Visadataset.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_download_failure_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut mock = MockDownloader::new();
        mock.expect_fetch()
            .returning(|url| Err(DownloadError::new(url, "HTTP status 404 Not Found")));

        let err = download(&mock, "https://x.org/v.csv", dir.path())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Download);
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_http_downloader_reads_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.csv");
        std::fs::write(&source, "x\n1\n").unwrap();

        let bytes = HttpDownloader::new(Duration::from_secs(5)).unwrap()
            .fetch(&format!("file://{}", source.display()))
            .await
            .unwrap();

        assert_eq!(bytes, b"x\n1\n");
    }

    #[tokio::test]
    async fn test_http_downloader_missing_file() {
        let err = HttpDownloader::new(Duration::from_secs(5)).unwrap()
            .fetch("file:///no/such/file.csv")
            .await
            .unwrap_err();
        assert_eq!(err.url, "file:///no/such/file.csv");
    }

    #[tokio::test]
    async fn test_http_downloader_times_out_on_stalled_server() {
        // Connections complete in the backlog but no response is ever sent.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/Visadataset.csv", listener.local_addr().unwrap());
        let downloader = HttpDownloader::new(Duration::from_millis(200)).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), downloader.fetch(&url))
            .await
            .expect("request should time out on its own");

        let err = result.unwrap_err();
        assert_eq!(err.url, url);
        drop(listener);
    }
}
