//! Adapter interfaces for external systems.
//!
//! The orchestrator only sees two capabilities: a [`MediaAssembler`] that
//! turns a still image plus an audio track into a video, and a
//! [`Publisher`] that ships the video somewhere with its metadata.

pub mod directory;
pub mod ffmpeg;
pub mod youtube;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

// Re-export the concrete adapters
pub use directory::DirectoryPublisher;
pub use ffmpeg::FfmpegAssembler;
pub use youtube::{YouTubeConfig, YouTubePublisher};

/// Errors from the external encoder
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} failed with exit code {code}: {stderr}")]
    Failed {
        binary: String,
        code: i32,
        stderr: String,
    },

    #[error("{binary} exited successfully but {} is missing or empty", .output.display())]
    MissingOutput { binary: String, output: PathBuf },
}

/// Combines a still image and an audio track into one video file
#[async_trait]
pub trait MediaAssembler: Send + Sync {
    /// Human-readable assembler name
    fn name(&self) -> &str;

    /// Loop `image` for the whole of `audio` and write the result to
    /// `output`. On error no valid file is left at `output`.
    async fn assemble(&self, image: &Path, audio: &str, output: &Path)
        -> Result<(), EncodingError>;
}

/// Arguments of the publish contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub video_path: PathBuf,
}

/// What the publisher reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Where the video ended up (a URL or a path)
    pub destination: String,
}

/// Errors from a publisher
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("missing access token: environment variable {var} is not set")]
    MissingToken { var: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("could not write metadata: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

/// Publishes a finished video with its metadata
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Human-readable publisher name
    fn name(&self) -> &str;

    /// Publish the video. Called at most once per run.
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, PublishError>;
}
