//! Main orchestrator for episode-to-video runs.
//!
//! A run is strictly linear:
//!
//! ```text
//! Init → FeedLookup → Confirm → Render → Assemble → DeriveMetadata → Publish → Done
//! ```
//!
//! Any failure aborts the run. The workspace is released on every path
//! before the result is returned.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::adapters::{EncodingError, MediaAssembler, PublishReceipt, PublishRequest, Publisher};
use crate::domain::{Episode, PublishMetadata, TitleTemplate};
use crate::feed::{self, FeedSource};
use crate::render::{self, HexColor, RenderedImage, TitleCardSpec};

use super::error::PipelineError;
use super::workspace::Workspace;

const SLIDE_FILE: &str = "slide.png";
const VIDEO_FILE: &str = "vid.mp4";

/// Validated settings for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub feed: FeedSource,
    pub logo: PathBuf,
    pub title_template: TitleTemplate,
    pub foreground: HexColor,
    pub background: HexColor,
    pub width: u32,
    pub height: u32,
    pub extra_tags: Vec<String>,
    /// Parent directory for workspaces (system temp dir if unset)
    pub workspace_root: Option<PathBuf>,
}

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    FeedLookup,
    Confirm,
    Render,
    Assemble,
    DeriveMetadata,
    Publish,
    Done,
}

impl Stage {
    /// Move `current` to `self` and log the transition
    fn enter(self, current: &mut Stage) {
        debug!(from = %current, stage = %self, "Entering stage");
        *current = self;
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::FeedLookup => "feed_lookup",
            Self::Confirm => "confirm",
            Self::Render => "render",
            Self::Assemble => "assemble",
            Self::DeriveMetadata => "derive_metadata",
            Self::Publish => "publish",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// The assembled video inside the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Summary of a published run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub episode: Episode,
    pub metadata: PublishMetadata,
    pub receipt: PublishReceipt,
}

/// How a run ended when no error occurred
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Published(RunReport),
    /// Confirmation was refused; nothing was rendered or published
    Declined(Episode),
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    settings: PipelineSettings,
    client: reqwest::Client,
    assembler: Arc<dyn MediaAssembler>,
    publisher: Arc<dyn Publisher>,
}

impl Orchestrator {
    /// Create an orchestrator with the given collaborators
    pub fn new(
        settings: PipelineSettings,
        assembler: Arc<dyn MediaAssembler>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
            assembler,
            publisher,
        }
    }

    /// Find an episode in the configured feed
    pub async fn locate(&self, number: u32) -> Result<Episode, PipelineError> {
        locate(&self.client, &self.settings, number).await
    }

    /// Derive title, description and tags for an episode
    pub fn derive_metadata(&self, episode: &Episode) -> PublishMetadata {
        derive_metadata(&self.settings, episode)
    }

    /// Load the logo and render the episode's title card
    pub fn render_card(&self, episode: &Episode) -> Result<RenderedImage, PipelineError> {
        render_card(&self.settings, episode)
    }

    /// Run the whole pipeline for one episode.
    ///
    /// `confirm` gets a copy of the located episode and decides whether to
    /// continue.
    #[instrument(skip(self, confirm), fields(feed = %self.settings.feed))]
    pub async fn run<F, Fut>(&self, number: u32, confirm: F) -> Result<RunOutcome, PipelineError>
    where
        F: FnOnce(Episode) -> Fut + Send,
        Fut: Future<Output = bool> + Send,
    {
        let run_id = Uuid::new_v4();
        info!(%run_id, number, "Starting pipeline run");

        let mut stage = Stage::Init;
        let workspace = Workspace::acquire(self.settings.workspace_root.as_deref())?;

        let result = self
            .run_in_workspace(&workspace, &mut stage, run_id, number, confirm)
            .await;

        if let Err(ref e) = result {
            error!(%run_id, %stage, error = %e, "Pipeline aborted");
        }
        workspace.release();
        result
    }

    async fn run_in_workspace<F, Fut>(
        &self,
        workspace: &Workspace,
        stage: &mut Stage,
        run_id: Uuid,
        number: u32,
        confirm: F,
    ) -> Result<RunOutcome, PipelineError>
    where
        F: FnOnce(Episode) -> Fut + Send,
        Fut: Future<Output = bool> + Send,
    {
        Stage::FeedLookup.enter(stage);
        let episode = self.locate(number).await?;

        Stage::Confirm.enter(stage);
        if !confirm(episode.clone()).await {
            info!(%run_id, number, "Publishing declined");
            return Ok(RunOutcome::Declined(episode));
        }

        Stage::Render.enter(stage);
        let card = self.render_card(&episode)?;
        let slide = workspace.file(SLIDE_FILE);
        card.save_png(&slide)
            .map_err(|source| PipelineError::WriteImage {
                path: slide.clone(),
                source,
            })?;
        info!(path = %slide.display(), width = card.width(), height = card.height(), "Title card rendered");

        Stage::Assemble.enter(stage);
        let video = self.assemble(&slide, &episode, workspace).await?;

        Stage::DeriveMetadata.enter(stage);
        let metadata = self.derive_metadata(&episode);

        Stage::Publish.enter(stage);
        let request = PublishRequest {
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            tags: metadata.tags.clone(),
            video_path: video.path.clone(),
        };
        let receipt = self
            .publisher
            .publish(&request)
            .await
            .map_err(|source| PipelineError::Publish {
                title: metadata.title.clone(),
                publisher: self.publisher.name().to_string(),
                source,
            })?;

        Stage::Done.enter(stage);
        info!(%run_id, destination = %receipt.destination, "Episode published");

        Ok(RunOutcome::Published(RunReport {
            run_id,
            episode,
            metadata,
            receipt,
        }))
    }

    async fn assemble(
        &self,
        slide: &Path,
        episode: &Episode,
        workspace: &Workspace,
    ) -> Result<VideoArtifact, PipelineError> {
        let path = workspace.file(VIDEO_FILE);
        info!(assembler = self.assembler.name(), audio = %episode.audio_url, "Assembling video");

        self.assembler
            .assemble(slide, &episode.audio_url, &path)
            .await
            .map_err(|source| PipelineError::Assemble {
                audio: episode.audio_url.clone(),
                source,
            })?;

        let size_bytes = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => {
                return Err(PipelineError::Assemble {
                    audio: episode.audio_url.clone(),
                    source: EncodingError::MissingOutput {
                        binary: self.assembler.name().to_string(),
                        output: path,
                    },
                })
            }
        };
        info!(path = %path.display(), size_bytes, "Video ready");
        Ok(VideoArtifact { path, size_bytes })
    }
}

/// Find an episode in the configured feed
pub async fn locate(
    client: &reqwest::Client,
    settings: &PipelineSettings,
    number: u32,
) -> Result<Episode, PipelineError> {
    feed::locate_episode(client, &settings.feed, number)
        .await
        .map_err(|source| PipelineError::Feed {
            feed: settings.feed.to_string(),
            number,
            source,
        })
}

/// Derive title, description and tags for an episode
pub fn derive_metadata(settings: &PipelineSettings, episode: &Episode) -> PublishMetadata {
    PublishMetadata::derive(episode, &settings.title_template, &settings.extra_tags)
}

/// Load the logo and render an episode's title card
pub fn render_card(
    settings: &PipelineSettings,
    episode: &Episode,
) -> Result<RenderedImage, PipelineError> {
    let logo = image::open(&settings.logo).map_err(|source| PipelineError::Logo {
        path: settings.logo.clone(),
        source,
    })?;

    let spec = TitleCardSpec {
        logo,
        text: episode.card_text(),
        foreground: settings.foreground,
        background: settings.background,
        width: settings.width,
        height: settings.height,
    };
    render::render_title_card(&spec).map_err(|source| PipelineError::Render { source })
}
