use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::error::{SetupError, SetupResult};

/// Thin wrapper over the shared HTTP client.
///
/// Every request goes through [`Downloader::send`], so a non-2xx answer is
/// always a [`SetupError::DownloadFailed`] carrying the status code, and
/// sources can tell "not found" apart from transport trouble.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a prepared request and reject non-success statuses.
    pub async fn send(&self, request: RequestBuilder, url: &str) -> SetupResult<Response> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SetupError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// The body is read as text first so that a decoding failure surfaces as
    /// [`SetupError::Json`] (a malformed response) rather than a transport error.
    pub async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> SetupResult<T> {
        let body = self.send(request, url).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn text(&self, url: &str) -> SetupResult<String> {
        Ok(self.send(self.get(url), url).await?.text().await?)
    }

    // ── Artifact download ───────────────────────────────

    /// Stream `url` into `dest`, overwriting any existing file.
    ///
    /// The body lands in a sibling `<name>.part` file first and is renamed
    /// onto `dest` once complete, so a broken transfer never touches `dest`.
    /// The parent directory must already exist; the mods directory is owned
    /// by the caller.
    pub async fn download_file(&self, url: &str, dest: &Path) -> SetupResult<u64> {
        let response = self.send(self.get(url), url).await?;
        let partial = partial_path(dest);

        let written = match write_body(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                discard(&partial).await;
                return Err(e);
            }
        };

        if let Err(source) = tokio::fs::rename(&partial, dest).await {
            discard(&partial).await;
            return Err(SetupError::Io {
                path: dest.to_path_buf(),
                source,
            });
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }
}

/// `mods/foo.jar` -> `mods/foo.jar.part`
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_body(response: Response, path: &Path) -> SetupResult<u64> {
    let io_error = |source: std::io::Error| SetupError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(io_error)?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_error)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_error)?;
    Ok(written)
}

async fn discard(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove partial download {:?}: {}", partial, e);
        }
    }
}

/// `true` when the error is an HTTP 404 from [`Downloader::send`].
pub fn is_not_found(error: &SetupError) -> bool {
    matches!(
        error,
        SetupError::DownloadFailed { status, .. } if *status == StatusCode::NOT_FOUND.as_u16()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{downloader, truncating_server, TestHttpServer};
    use axum::{routing::get, Router};

    #[test]
    fn only_404_counts_as_not_found() {
        let missing = SetupError::DownloadFailed {
            url: "https://ci.example/job/x".into(),
            status: 404,
        };
        let broken = SetupError::DownloadFailed {
            url: "https://ci.example/job/x".into(),
            status: 502,
        };
        assert!(is_not_found(&missing));
        assert!(!is_not_found(&broken));
        assert!(!is_not_found(&SetupError::Other("x".into())));
    }

    #[tokio::test]
    async fn download_replaces_existing_file() {
        let server = TestHttpServer::new(
            Router::new().route("/mod.jar", get(|| async { "new contents" })),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mod.jar");
        std::fs::write(&dest, "an older and longer jar").unwrap();

        let written = downloader()
            .download_file(&server.url("/mod.jar"), &dest)
            .await
            .unwrap();

        assert_eq!(written, 12);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new contents");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn interrupted_download_keeps_previous_file() {
        let url = truncating_server(100_000, 4096).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mod.jar");
        std::fs::write(&dest, "previous good jar").unwrap();

        let result = downloader().download_file(&url, &dest).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous good jar");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn missing_artifact_creates_nothing() {
        let server = TestHttpServer::new(Router::new()).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("mod.jar");

        let err = downloader()
            .download_file(&server.url("/mod.jar"), &dest)
            .await
            .unwrap_err();

        assert!(is_not_found(&err));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn partial_file_sits_next_to_destination() {
        assert_eq!(
            partial_path(Path::new("mods/sodium-1.20.jar")),
            Path::new("mods/sodium-1.20.jar.part")
        );
    }
}
