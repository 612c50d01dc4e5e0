//! Local directory publisher.
//!
//! Copies the video into a directory next to a YAML sidecar with its
//! metadata. Useful for reviewing output before uploading anywhere.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{PublishError, PublishReceipt, PublishRequest, Publisher};

/// Sidecar written next to each published video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidecar {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
}

/// Publisher that writes into a local directory
pub struct DirectoryPublisher {
    dir: PathBuf,
}

impl DirectoryPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// File-name-safe form of a title: lowercase alphanumerics joined by `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "video".to_string()
    } else {
        slug
    }
}

fn io_err(context: String) -> impl FnOnce(std::io::Error) -> PublishError {
    move |source| PublishError::Io { context, source }
}

#[async_trait]
impl Publisher for DirectoryPublisher {
    fn name(&self) -> &str {
        "directory"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_err(format!("could not create {}", self.dir.display())))?;

        let slug = slugify(&request.title);
        let video = self.dir.join(format!("{}.mp4", slug));
        let sidecar_path = self.dir.join(format!("{}.yaml", slug));

        tokio::fs::copy(&request.video_path, &video)
            .await
            .map_err(io_err(format!(
                "could not copy {} to {}",
                request.video_path.display(),
                video.display()
            )))?;

        let sidecar = Sidecar {
            title: request.title.clone(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            published_at: Utc::now(),
        };
        let yaml = serde_yaml::to_string(&sidecar)?;
        tokio::fs::write(&sidecar_path, yaml)
            .await
            .map_err(io_err(format!("could not write {}", sidecar_path.display())))?;

        info!(path = %video.display(), "Published to directory");
        Ok(PublishReceipt {
            destination: video.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Test: GCPPodcast 5"), "test-gcppodcast-5");
        assert_eq!(slugify("  --Hello,  World!-- "), "hello-world");
        assert_eq!(slugify("!!!"), "video");
    }

    #[tokio::test]
    async fn test_publish_copies_video_and_writes_sidecar() {
        let src = TempDir::new().unwrap();
        let video_path = src.path().join("vid.mp4");
        std::fs::write(&video_path, b"not really a video").unwrap();

        let out = TempDir::new().unwrap();
        let publisher = DirectoryPublisher::new(out.path().join("published"));
        let receipt = publisher
            .publish(&PublishRequest {
                title: "Test: GCPPodcast 5".to_string(),
                description: "Original post: http://x/5\n\nHi".to_string(),
                tags: vec!["a".to_string(), "podcast".to_string()],
                video_path,
            })
            .await
            .unwrap();

        let published = out.path().join("published").join("test-gcppodcast-5.mp4");
        assert_eq!(receipt.destination, published.display().to_string());
        assert_eq!(std::fs::read(&published).unwrap(), b"not really a video");

        let sidecar: Sidecar = serde_yaml::from_str(
            &std::fs::read_to_string(out.path().join("published").join("test-gcppodcast-5.yaml"))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(sidecar.title, "Test: GCPPodcast 5");
        assert_eq!(sidecar.description, "Original post: http://x/5\n\nHi");
        assert_eq!(sidecar.tags, vec!["a", "podcast"]);
    }

    #[tokio::test]
    async fn test_missing_video_is_io_error() {
        let out = TempDir::new().unwrap();
        let publisher = DirectoryPublisher::new(out.path());
        let err = publisher
            .publish(&PublishRequest {
                title: "t".to_string(),
                description: String::new(),
                tags: vec![],
                video_path: out.path().join("missing.mp4"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));
    }
}
