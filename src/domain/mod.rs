//! Domain types for podcast2video.
//!
//! This module contains the core data structures:
//! - Episode: the feed entry being turned into a video
//! - Metadata: title/description/tags derived for publishing

pub mod episode;
pub mod metadata;

// Re-export commonly used types
pub use episode::Episode;
pub use metadata::{strip_markup, PublishMetadata, TemplateError, TitleTemplate, DEFAULT_EXTRA_TAGS};
