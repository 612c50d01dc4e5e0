//! YouTube publisher.
//!
//! Uses the Data API v3 resumable upload protocol: one POST with the video
//! metadata opens an upload session, one PUT sends the file.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{PublishError, PublishReceipt, PublishRequest, Publisher};

const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

const VIDEO_MIME: &str = "video/mp4";

/// Settings for YouTube uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// `private`, `unlisted` or `public`
    #[serde(default = "default_privacy")]
    pub privacy: String,

    /// YouTube category ID (28 = Science & Technology)
    #[serde(default = "default_category_id")]
    pub category_id: String,

    /// Environment variable holding the OAuth access token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_privacy() -> String {
    "private".to_string()
}
fn default_category_id() -> String {
    "28".to_string()
}
fn default_token_env() -> String {
    "YOUTUBE_ACCESS_TOKEN".to_string()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            privacy: default_privacy(),
            category_id: default_category_id(),
            token_env: default_token_env(),
        }
    }
}

/// Video resource returned once the upload completes
#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// YouTube Data API uploader
pub struct YouTubePublisher {
    config: YouTubeConfig,
    access_token: String,
    upload_url: String,
    client: reqwest::Client,
}

impl YouTubePublisher {
    /// Create a publisher with an explicit access token
    pub fn new(config: YouTubeConfig, access_token: String) -> Self {
        Self {
            config,
            access_token,
            upload_url: UPLOAD_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a publisher, reading the token from `config.token_env`
    pub fn from_env(config: YouTubeConfig) -> Result<Self, PublishError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PublishError::MissingToken {
                var: config.token_env.clone(),
            })?;
        Ok(Self::new(config, token))
    }

    /// Request body for the upload session
    fn video_resource(&self, request: &PublishRequest) -> serde_json::Value {
        serde_json::json!({
            "snippet": {
                "title": request.title,
                "description": request.description,
                "tags": request.tags,
                "categoryId": self.config.category_id,
            },
            "status": {
                "privacyStatus": self.config.privacy,
            }
        })
    }

    async fn open_session(
        &self,
        request: &PublishRequest,
        content_length: u64,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(&self.upload_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header("X-Upload-Content-Type", VIDEO_MIME)
            .header("X-Upload-Content-Length", content_length.to_string())
            .json(&self.video_resource(request))
            .send()
            .await
            .map_err(|source| PublishError::Http {
                context: "could not start upload session".to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PublishError::Protocol("upload session has no Location header".into()))
    }

    /// Stream the file into the session. The length is sent up front since a
    /// streamed body has none of its own.
    async fn upload(
        &self,
        session_url: &str,
        video_path: &Path,
        content_length: u64,
    ) -> Result<String, PublishError> {
        let file = tokio::fs::File::open(video_path)
            .await
            .map_err(|source| PublishError::Io {
                context: format!("could not open {}", video_path.display()),
                source,
            })?;

        let response = self
            .client
            .put(session_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(CONTENT_TYPE, VIDEO_MIME)
            .header(CONTENT_LENGTH, content_length)
            .body(Body::from(file))
            .send()
            .await
            .map_err(|source| PublishError::Http {
                context: "could not upload video".to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let video: VideoResource = response.json().await.map_err(|source| PublishError::Http {
            context: "could not parse upload response".to_string(),
            source,
        })?;
        Ok(video.id)
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        let content_length = tokio::fs::metadata(&request.video_path)
            .await
            .map_err(|source| PublishError::Io {
                context: format!("could not stat {}", request.video_path.display()),
                source,
            })?
            .len();

        let session_url = self.open_session(request, content_length).await?;
        debug!(bytes = content_length, "Upload session opened");

        let id = self
            .upload(&session_url, &request.video_path, content_length)
            .await?;
        let destination = format!("https://www.youtube.com/watch?v={}", id);
        info!(%destination, title = %request.title, "Uploaded to YouTube");

        Ok(PublishReceipt { destination })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request() -> PublishRequest {
        PublishRequest {
            title: "Test: GCPPodcast 5".to_string(),
            description: "Original post: http://x/5\n\nHi".to_string(),
            tags: vec!["a".to_string(), "podcast".to_string()],
            video_path: PathBuf::from("/tmp/vid.mp4"),
        }
    }

    #[test]
    fn test_publisher_creation() {
        let publisher = YouTubePublisher::new(YouTubeConfig::default(), "token".to_string());
        assert_eq!(publisher.name(), "youtube");
        assert_eq!(publisher.upload_url, UPLOAD_URL);
    }

    #[test]
    fn test_video_resource_body() {
        let config = YouTubeConfig {
            privacy: "unlisted".to_string(),
            ..Default::default()
        };
        let publisher = YouTubePublisher::new(config, "token".to_string());
        let body = publisher.video_resource(&request());

        assert_eq!(body["snippet"]["title"], "Test: GCPPodcast 5");
        assert_eq!(body["snippet"]["description"], "Original post: http://x/5\n\nHi");
        assert_eq!(body["snippet"]["tags"], serde_json::json!(["a", "podcast"]));
        assert_eq!(body["snippet"]["categoryId"], "28");
        assert_eq!(body["status"]["privacyStatus"], "unlisted");
    }

    #[test]
    fn test_missing_token() {
        let config = YouTubeConfig {
            token_env: "PODCAST2VIDEO_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = YouTubePublisher::from_env(config).err().unwrap();
        assert!(matches!(err, PublishError::MissingToken { .. }));
    }

    #[tokio::test]
    async fn test_missing_video_is_io_error() {
        let publisher = YouTubePublisher::new(YouTubeConfig::default(), "token".to_string());
        let mut req = request();
        req.video_path = PathBuf::from("/nonexistent/podcast2video/vid.mp4");
        let err = publisher.publish(&req).await.unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));
    }

    #[test]
    fn test_config_defaults_from_yaml() {
        let config: YouTubeConfig = serde_yaml::from_str("privacy: public").unwrap();
        assert_eq!(config.privacy, "public");
        assert_eq!(config.category_id, "28");
        assert_eq!(config.token_env, "YOUTUBE_ACCESS_TOKEN");
    }

    /// Accept one connection, capture the request head and body, reply with `response`
    async fn serve_once(listener: &TcpListener, response: String) -> (String, Vec<u8>) {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request head");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);

        while buf.len() < header_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the request body");
            buf.extend_from_slice(&chunk[..n]);
        }

        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        (head, buf[header_end..].to_vec())
    }

    #[tokio::test]
    async fn test_upload_streams_file_with_declared_length() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("vid.mp4");
        std::fs::write(&video, b"fake video bytes").unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let session = format!(
                "HTTP/1.1 200 OK\r\nLocation: http://{}/session\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                addr
            );
            let (open_head, open_body) = serve_once(&listener, session).await;

            let body = r#"{"id":"abc123"}"#;
            let done = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let (put_head, put_body) = serve_once(&listener, done).await;
            (open_head, open_body, put_head, put_body)
        });

        let mut publisher = YouTubePublisher::new(YouTubeConfig::default(), "token".to_string());
        publisher.upload_url = format!("http://{}/upload", addr);
        let mut req = request();
        req.video_path = video;

        let receipt = publisher.publish(&req).await.unwrap();
        assert_eq!(receipt.destination, "https://www.youtube.com/watch?v=abc123");

        let (open_head, open_body, put_head, put_body) = server.await.unwrap();
        assert!(open_head.starts_with("POST /upload"));
        assert!(open_head
            .to_ascii_lowercase()
            .contains("x-upload-content-length: 16"));
        let resource: serde_json::Value = serde_json::from_slice(&open_body).unwrap();
        assert_eq!(resource["snippet"]["title"], "Test: GCPPodcast 5");

        assert!(put_head.starts_with("PUT /session"));
        assert!(put_head.to_ascii_lowercase().contains("content-length: 16"));
        assert_eq!(put_body, b"fake video bytes");
    }
}
