//! Pipeline error taxonomy.
//!
//! Each component keeps its own error enum. [`PipelineError`] wraps them with
//! the operation and input that failed; [`ErrorKind`] lets callers branch on
//! the failure class without matching every variant.

use std::path::PathBuf;

use thiserror::Error;

use super::workspace::WorkspaceError;
use crate::adapters::{EncodingError, PublishError};
use crate::feed::FeedError;
use crate::render::RenderError;

/// Failure class of a pipeline error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Feed or audio retrieval failed
    Fetch,
    /// Feed document malformed
    Parse,
    /// No episode with the requested number
    NotFound,
    /// Bad color, dimensions or logo
    InvalidInput,
    /// External encoder failed
    Encoding,
    /// Temporary directory trouble
    Workspace,
    /// Publisher failed
    Publish,
}

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not look up episode {number} in {feed}: {source}")]
    Feed {
        feed: String,
        number: u32,
        #[source]
        source: FeedError,
    },

    #[error("could not load logo {}: {source}", .path.display())]
    Logo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not create image: {source}")]
    Render {
        #[source]
        source: RenderError,
    },

    #[error("could not write title card to {}: {source}", .path.display())]
    WriteImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not create video from {audio}: {source}")]
    Assemble {
        audio: String,
        #[source]
        source: EncodingError,
    },

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("could not publish {title:?} via {publisher}: {source}")]
    Publish {
        title: String,
        publisher: String,
        #[source]
        source: PublishError,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Feed { source, .. } => match source {
                FeedError::Fetch { .. } => ErrorKind::Fetch,
                FeedError::Parse { .. } => ErrorKind::Parse,
                FeedError::NotFound { .. } => ErrorKind::NotFound,
            },
            Self::Logo { .. } => ErrorKind::InvalidInput,
            Self::Render { source } => match source {
                RenderError::Encode(_) => ErrorKind::Workspace,
                RenderError::InvalidColor { .. } | RenderError::InvalidDimensions { .. } => {
                    ErrorKind::InvalidInput
                }
            },
            Self::WriteImage { .. } | Self::Workspace(_) => ErrorKind::Workspace,
            Self::Assemble { .. } => ErrorKind::Encoding,
            Self::Publish { .. } => ErrorKind::Publish,
        }
    }
}
