//! Configuration for podcast2video.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags
//! 2. Environment variables (PODCAST2VIDEO_FEED, PODCAST2VIDEO_LOGO, PODCAST2VIDEO_FFMPEG)
//! 3. Config file (.podcast2video/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - An explicit `--config` path wins
//! - Otherwise searches current directory and parents for .podcast2video/config.yaml
//! - Otherwise falls back to the user config dir (~/.config/podcast2video/config.yaml)
//! - Paths in the config file are relative to the project root (the parent of
//!   .podcast2video/) or, for other locations, to the file's own directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::YouTubeConfig;
use crate::core::PipelineSettings;
use crate::domain::{TitleTemplate, DEFAULT_EXTRA_TAGS};
use crate::feed::FeedSource;
use crate::render::HexColor;

pub const DEFAULT_FEED: &str = "http://feeds.feedburner.com/GcpPodcast?format=xml";
pub const DEFAULT_LOGO: &str = "logo.png";
pub const DEFAULT_TITLE_TEMPLATE: &str = "%s: GCPPodcast %d";
pub const DEFAULT_FG: &str = "ffffff";
pub const DEFAULT_BG: &str = "009688";
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 800;
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

const CONFIG_DIR: &str = ".podcast2video";
const CONFIG_NAME: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub feed: Option<String>,
    pub logo: Option<String>,
    pub title_template: Option<String>,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub extra_tags: Option<Vec<String>>,
    pub ffmpeg: Option<String>,
    pub workspace_root: Option<String>,
    pub publisher: Option<PublisherConfig>,
}

/// Where finished videos go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublisherConfig {
    /// Upload with the YouTube Data API
    Youtube(YouTubeConfig),

    /// Copy into a local directory
    Directory { path: PathBuf },
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self::Youtube(YouTubeConfig::default())
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub feed: Option<String>,
    pub logo: Option<PathBuf>,
    pub title_template: Option<String>,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub feed: String,
    pub logo: PathBuf,
    pub title_template: String,
    pub fg: String,
    pub bg: String,
    pub width: u32,
    pub height: u32,
    pub extra_tags: Vec<String>,
    pub ffmpeg: String,
    pub workspace_root: Option<PathBuf>,
    pub publisher: PublisherConfig,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Validate and convert into pipeline settings
    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        let title_template =
            TitleTemplate::parse(&self.title_template).context("Invalid title template")?;
        let foreground = HexColor::parse(&self.fg).context("Invalid foreground color")?;
        let background = HexColor::parse(&self.bg).context("Invalid background color")?;

        if self.width == 0 || self.height == 0 {
            anyhow::bail!(
                "Invalid video size {}x{}: width and height must be positive",
                self.width,
                self.height
            );
        }

        Ok(PipelineSettings {
            feed: FeedSource::parse(&self.feed),
            logo: self.logo.clone(),
            title_template,
            foreground,
            background,
            width: self.width,
            height: self.height,
            extra_tags: self.extra_tags.clone(),
            workspace_root: self.workspace_root.clone(),
        })
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("podcast2video").join(CONFIG_NAME);
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Directory that relative paths in a config file are resolved against
fn base_dir(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or(Path::new("."));
    if parent.file_name().map(|n| n == CONFIG_DIR).unwrap_or(false) {
        parent.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

/// Resolve a path that may be relative to the config file's base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge all sources. `env` looks up environment variables.
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
) -> ResolvedConfig {
    let (config_file, file, base) = match file {
        Some((path, file)) => {
            let base = base_dir(&path);
            (Some(path), file, Some(base))
        }
        None => (None, ConfigFile::default(), None),
    };
    let from_file = |p: &str| match &base {
        Some(base) => resolve_path(base, p),
        None => PathBuf::from(p),
    };

    let feed = overrides
        .feed
        .clone()
        .or_else(|| env("PODCAST2VIDEO_FEED"))
        .or_else(|| {
            file.feed.as_deref().map(|f| match FeedSource::parse(f) {
                FeedSource::Url(url) => url,
                FeedSource::File(_) => from_file(f).display().to_string(),
            })
        })
        .unwrap_or_else(|| DEFAULT_FEED.to_string());

    let logo = overrides
        .logo
        .clone()
        .or_else(|| env("PODCAST2VIDEO_LOGO").map(PathBuf::from))
        .or_else(|| file.logo.as_deref().map(from_file))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGO));

    let ffmpeg = env("PODCAST2VIDEO_FFMPEG")
        .or(file.ffmpeg.clone())
        .unwrap_or_else(|| DEFAULT_FFMPEG.to_string());

    let publisher = match file.publisher.clone() {
        Some(PublisherConfig::Directory { path }) => PublisherConfig::Directory {
            path: from_file(&path.to_string_lossy()),
        },
        Some(other) => other,
        None => PublisherConfig::default(),
    };

    ResolvedConfig {
        feed,
        logo,
        title_template: overrides
            .title_template
            .clone()
            .or(file.title_template.clone())
            .unwrap_or_else(|| DEFAULT_TITLE_TEMPLATE.to_string()),
        fg: overrides
            .fg
            .clone()
            .or(file.fg.clone())
            .unwrap_or_else(|| DEFAULT_FG.to_string()),
        bg: overrides
            .bg
            .clone()
            .or(file.bg.clone())
            .unwrap_or_else(|| DEFAULT_BG.to_string()),
        width: overrides.width.or(file.width).unwrap_or(DEFAULT_WIDTH),
        height: overrides.height.or(file.height).unwrap_or(DEFAULT_HEIGHT),
        extra_tags: file
            .extra_tags
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTRA_TAGS.iter().map(|t| t.to_string()).collect()),
        ffmpeg,
        workspace_root: file.workspace_root.as_deref().map(from_file),
        publisher,
        config_file,
    }
}

/// Load configuration from all sources and validate it
pub fn load_config(overrides: &Overrides) -> Result<ResolvedConfig> {
    let path = match &overrides.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };

    let file = match path {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    let config = resolve(file, |key| std::env::var(key).ok(), overrides);
    config.pipeline_settings()?;
    Ok(config)
}
