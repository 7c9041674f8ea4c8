use crate::config::PixhostConfig;
use crate::error::UploadError;
use crate::ports::ImageHost;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

const SHOW_PREFIX: &str = "https://pixhost.to/show/";
const DIRECT_PREFIX: &str = "https://img2.pixhost.to/images/";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    show_url: String,
}

/// Rewrites a Pixhost page URL into the direct image URL. Other URLs pass through.
pub fn direct_image_url(show_url: &str) -> String {
    show_url.replacen(SHOW_PREFIX, DIRECT_PREFIX, 1)
}

/// [`ImageHost`] for pixhost.to with linear-backoff retries.
#[derive(Debug, Clone)]
pub struct PixhostClient {
    client: Client,
    endpoint: String,
    attempts: u32,
    retry_delay: Duration,
}

impl PixhostClient {
    pub fn new(config: &PixhostConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self::from_parts(
            client,
            config.endpoint.clone(),
            config.attempts,
            config.retry_delay,
        ))
    }

    pub fn from_parts(
        client: Client,
        endpoint: impl Into<String>,
        attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    async fn upload_once(&self, image: &Path) -> Result<String, UploadError> {
        let file = tokio::fs::File::open(image).await?;
        let length = file.metadata().await?.len();
        let file_name = image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("screenshot.png"));

        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = Form::new().part("img", part).text("content_type", "0");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: UploadResponse =
            serde_json::from_str(&body).map_err(|err| UploadError::Decode(err.to_string()))?;
        Ok(direct_image_url(&parsed.show_url))
    }
}

#[async_trait]
impl ImageHost for PixhostClient {
    async fn upload(&self, image: &Path) -> Result<String, UploadError> {
        let mut attempt = 1;
        loop {
            info!(image = %image.display(), attempt, of = self.attempts, "uploading screenshot");

            let err = match self.upload_once(image).await {
                Ok(url) => {
                    info!(%url, "upload succeeded");
                    return Ok(url);
                }
                // The file itself is unreadable; another attempt cannot help.
                Err(err @ UploadError::Io(_)) => return Err(err),
                Err(err) => err,
            };

            warn!(attempt, error = %err, "upload attempt failed");
            if attempt >= self.attempts {
                return Err(UploadError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            tokio::time::sleep(self.retry_delay * attempt).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::routing::post;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Fails the first `failures` requests with 503, then answers like Pixhost.
    async fn spawn_host(failures: usize, reply: &'static str) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let app = Router::new().route(
            "/images",
            post(move |body: Bytes| {
                let counter = counter.clone();
                async move {
                    let seen = counter.fetch_add(1, Ordering::SeqCst);
                    let text = String::from_utf8_lossy(&body);
                    if !text.contains("name=\"img\"") || !text.contains("name=\"content_type\"")
                    {
                        return (axum::http::StatusCode::BAD_REQUEST, "bad form".to_string());
                    }
                    if seen < failures {
                        return (
                            axum::http::StatusCode::SERVICE_UNAVAILABLE,
                            "busy".to_string(),
                        );
                    }
                    (axum::http::StatusCode::OK, reply.to_string())
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/images", addr), hits)
    }

    fn client(endpoint: String, attempts: u32) -> PixhostClient {
        let http = Client::builder().no_proxy().build().unwrap();
        PixhostClient::from_parts(http, endpoint, attempts, Duration::from_millis(10))
    }

    fn screenshot(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("s1_00h09m00s.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();
        path
    }

    const OK_REPLY: &str = r#"{"name":"s1.png","show_url":"https://pixhost.to/show/12/345_s1.png","th_url":"https://t2.pixhost.to/thumbs/12/345_s1.png"}"#;

    #[test]
    fn test_direct_image_url() {
        assert_eq!(
            direct_image_url("https://pixhost.to/show/12/345_s1.png"),
            "https://img2.pixhost.to/images/12/345_s1.png"
        );
        assert_eq!(
            direct_image_url("https://elsewhere.example/a.png"),
            "https://elsewhere.example/a.png"
        );
    }

    #[tokio::test]
    async fn test_upload_returns_direct_url() {
        let dir = TempDir::new().unwrap();
        let (endpoint, hits) = spawn_host(0, OK_REPLY).await;

        let url = client(endpoint, 3).upload(&screenshot(&dir)).await.unwrap();
        assert_eq!(url, "https://img2.pixhost.to/images/12/345_s1.png");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upload_retries_until_success() {
        let dir = TempDir::new().unwrap();
        let (endpoint, hits) = spawn_host(2, OK_REPLY).await;

        let url = client(endpoint, 3).upload(&screenshot(&dir)).await.unwrap();
        assert!(url.starts_with(DIRECT_PREFIX));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_upload_gives_up_after_attempts() {
        let dir = TempDir::new().unwrap();
        let (endpoint, hits) = spawn_host(usize::MAX, OK_REPLY).await;

        let err = client(endpoint, 3)
            .upload(&screenshot(&dir))
            .await
            .unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        match err {
            UploadError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, UploadError::Status { status: 503, .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_reply_is_retried() {
        let dir = TempDir::new().unwrap();
        let (endpoint, hits) = spawn_host(0, "<html>maintenance</html>").await;

        let err = client(endpoint, 2)
            .upload(&screenshot(&dir))
            .await
            .unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err,
            UploadError::Exhausted { ref last, .. } if matches!(**last, UploadError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let (endpoint, hits) = spawn_host(0, OK_REPLY).await;

        let err = client(endpoint, 3)
            .upload(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
