//! Core orchestration logic.
//!
//! This module contains:
//! - Workspace: scoped temp directory for intermediate files
//! - Error: pipeline error taxonomy
//! - Orchestrator: the episode-to-video run

pub mod error;
pub mod orchestrator;
pub mod workspace;

// Re-export commonly used types
pub use error::{ErrorKind, PipelineError};
pub use orchestrator::{
    Orchestrator, PipelineSettings, RunOutcome, RunReport, Stage, VideoArtifact,
};
pub use workspace::{Workspace, WorkspaceError};
