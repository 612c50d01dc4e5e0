//! podcast2video - Turn podcast episodes into publishable videos
//!
//! Looks up an episode in an RSS feed by its ordinal number, renders a
//! title card, combines the card with the episode audio into a video, and
//! hands the video to a publisher with a derived title, description and
//! tag list.
//!
//! # Pipeline
//!
//! ```text
//! feed lookup → confirm → title card → assemble → metadata → publish
//! ```
//!
//! Intermediate files live in a per-run temporary workspace that is
//! removed on every exit path.
//!
//! # Modules
//!
//! - `adapters`: External tools and services (ffmpeg, YouTube, local directory)
//! - `config`: Layered configuration (flags, env, YAML file, defaults)
//! - `core`: Orchestration logic (Orchestrator, Workspace, errors)
//! - `domain`: Data structures (Episode, PublishMetadata, TitleTemplate)
//! - `feed`: RSS retrieval and parsing
//! - `render`: Title-card rendering
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Publish episode 42, asking for confirmation first
//! podcast2video publish 42
//!
//! # Preview the derived metadata
//! podcast2video show 42
//!
//! # Render only the title card
//! podcast2video render 42 --output card.png
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod feed;
pub mod render;

// Re-export main types at crate root for convenience
pub use core::{ErrorKind, Orchestrator, PipelineError, PipelineSettings, RunOutcome};
pub use domain::{Episode, PublishMetadata, TitleTemplate};
