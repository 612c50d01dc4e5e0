//! Command-line interface for podcast2video.
//!
//! Provides commands for publishing an episode as a video, previewing an
//! episode's derived metadata, rendering a title card on its own, and
//! showing the resolved configuration.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::adapters::{DirectoryPublisher, FfmpegAssembler, Publisher, YouTubePublisher};
use crate::config::{self, Overrides, PublisherConfig, ResolvedConfig};
use crate::core::{orchestrator, Orchestrator, RunOutcome};
use crate::domain::Episode;

/// podcast2video - Turn podcast episodes into publishable videos
#[derive(Parser, Debug)]
#[command(name = "podcast2video")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command
#[derive(Args, Debug, Default)]
pub struct GlobalOptions {
    /// Config file (default: discovered .podcast2video/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// RSS feed URL or local path
    #[arg(long, alias = "rss", global = true)]
    pub feed: Option<String>,

    /// Logo image placed on the title card
    #[arg(long, global = true)]
    pub logo: Option<PathBuf>,

    /// Video title template with one %s (title) and one %d (number)
    #[arg(long = "title", global = true)]
    pub title_template: Option<String>,

    /// Text color as 6 hex digits
    #[arg(long, global = true)]
    pub fg: Option<String>,

    /// Background color as 6 hex digits
    #[arg(long, global = true)]
    pub bg: Option<String>,

    /// Title card width in pixels
    #[arg(long, global = true)]
    pub width: Option<u32>,

    /// Title card height in pixels
    #[arg(long, global = true)]
    pub height: Option<u32>,
}

impl GlobalOptions {
    fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            feed: self.feed.clone(),
            logo: self.logo.clone(),
            title_template: self.title_template.clone(),
            fg: self.fg.clone(),
            bg: self.bg.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render, assemble and publish an episode
    Publish {
        /// Episode number (prompted for if not provided)
        number: Option<u32>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show an episode and the metadata it would be published with
    Show {
        /// Episode number
        number: u32,
    },

    /// Render an episode's title card to a PNG file
    Render {
        /// Episode number
        number: u32,

        /// Output PNG path
        #[arg(short, long, default_value = "slide.png")]
        output: PathBuf,
    },

    /// Print the resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = config::load_config(&self.options.overrides())?;

        match self.command {
            Commands::Publish { number, yes } => publish(&config, number, yes).await,
            Commands::Show { number } => show(&config, number).await,
            Commands::Render { number, output } => render(&config, number, output).await,
            Commands::Config => print_config(&config),
        }
    }
}

async fn publish(config: &ResolvedConfig, number: Option<u32>, yes: bool) -> Result<()> {
    let settings = config.pipeline_settings()?;
    // Fail on a missing token before any work is done.
    let publisher = build_publisher(&config.publisher)?;
    let assembler = Arc::new(FfmpegAssembler::with_binary_path(&config.ffmpeg));

    let number = match number {
        Some(n) => n,
        None => blocking_prompt(|| prompt_episode_number(&mut io::stdin().lock())).await?,
    };

    let orchestrator = Orchestrator::new(settings, assembler, publisher);
    let outcome = orchestrator
        .run(number, |episode| async move {
            if yes {
                eprintln!("episode {}: {}", episode.number, episode.title);
                return true;
            }
            blocking_prompt(move || confirm_publish(&episode, &mut io::stdin().lock()))
                .await
                .unwrap_or(false)
        })
        .await
        .with_context(|| format!("Failed to publish episode {}", number))?;

    match outcome {
        RunOutcome::Published(report) => {
            eprintln!("\n[Run {} completed successfully]", report.run_id);
            eprintln!("   Title: {}", report.metadata.title);
            println!("{}", report.receipt.destination);
        }
        RunOutcome::Declined(episode) => {
            eprintln!("[Episode {} not published]", episode.number);
        }
    }
    Ok(())
}

async fn show(config: &ResolvedConfig, number: u32) -> Result<()> {
    let settings = config.pipeline_settings()?;
    let client = reqwest::Client::new();
    let episode = orchestrator::locate(&client, &settings, number).await?;
    let metadata = orchestrator::derive_metadata(&settings, &episode);

    println!("Number: {}", episode.number);
    println!("Title: {}", episode.title);
    println!("Link: {}", episode.link);
    println!("Audio: {}", episode.audio_url);
    println!("Card text: {}", episode.card_text());
    println!("\nVideo title: {}", metadata.title);
    println!("Tags: {}", metadata.tags.join(", "));
    println!("\n{}", metadata.description);
    Ok(())
}

async fn render(config: &ResolvedConfig, number: u32, output: PathBuf) -> Result<()> {
    let settings = config.pipeline_settings()?;
    let client = reqwest::Client::new();
    let episode = orchestrator::locate(&client, &settings, number).await?;

    let card = orchestrator::render_card(&settings, &episode)?;
    card.save_png(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!(
        "Rendered {}x{} title card for episode {} to {}",
        card.width(),
        card.height(),
        episode.number,
        output.display()
    );
    Ok(())
}

fn print_config(config: &ResolvedConfig) -> Result<()> {
    match &config.config_file {
        Some(path) => eprintln!("# Loaded from {}", path.display()),
        None => eprintln!("# No config file found, using defaults"),
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

fn build_publisher(config: &PublisherConfig) -> Result<Arc<dyn Publisher>> {
    let publisher: Arc<dyn Publisher> = match config {
        PublisherConfig::Youtube(youtube) => Arc::new(
            YouTubePublisher::from_env(youtube.clone())
                .context("YouTube publisher is not configured")?,
        ),
        PublisherConfig::Directory { path } => Arc::new(DirectoryPublisher::new(path.clone())),
    };
    Ok(publisher)
}

/// Run a stdin prompt off the async runtime so Ctrl-C stays responsive
async fn blocking_prompt<T, F>(prompt: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .context("Prompt task failed")?
}

fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn prompt_episode_number(reader: &mut impl BufRead) -> Result<u32> {
    print!("episode number to publish: ");
    io::stdout().flush().ok();

    let answer = read_answer(reader)?;
    parse_episode_number(&answer)
}

fn parse_episode_number(answer: &str) -> Result<u32> {
    answer
        .parse()
        .with_context(|| format!("Invalid episode number: {:?}", answer))
}

fn confirm_publish(episode: &Episode, reader: &mut impl BufRead) -> Result<bool> {
    println!("episode {}: {}", episode.number, episode.title);
    print!("publish? (Y/n) ");
    io::stdout().flush().ok();

    let answer = read_answer(reader)?;
    Ok(is_affirmative(&answer))
}

/// Empty input counts as yes
fn is_affirmative(answer: &str) -> bool {
    matches!(answer, "" | "y" | "Y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn episode() -> Episode {
        Episode {
            title: "Kubernetes".to_string(),
            number: 5,
            link: "http://x/5".to_string(),
            description: "Hi".to_string(),
            audio_url: "http://x/5.mp3".to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative(""));
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yes"));
    }

    #[test]
    fn test_confirm_reads_one_line() {
        let mut input = Cursor::new("\nn\n");
        assert!(confirm_publish(&episode(), &mut input).unwrap());
        assert!(!confirm_publish(&episode(), &mut input).unwrap());
    }

    #[test]
    fn test_confirm_at_eof_defaults_to_yes() {
        let mut input = Cursor::new("");
        assert!(confirm_publish(&episode(), &mut input).unwrap());
    }

    #[test]
    fn test_prompt_episode_number() {
        let mut input = Cursor::new("  42 \n");
        assert_eq!(prompt_episode_number(&mut input).unwrap(), 42);

        let mut input = Cursor::new("forty-two\n");
        assert!(prompt_episode_number(&mut input).is_err());
    }

    #[test]
    fn test_parse_episode_number_rejects_negative() {
        assert!(parse_episode_number("-1").is_err());
        assert_eq!(parse_episode_number("0").unwrap(), 0);
    }

    #[test]
    fn test_build_directory_publisher() {
        let publisher = build_publisher(&PublisherConfig::Directory {
            path: PathBuf::from("/tmp/out"),
        })
        .unwrap();
        assert_eq!(publisher.name(), "directory");
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "podcast2video",
            "publish",
            "7",
            "--yes",
            "--feed",
            "feed.xml",
            "--fg",
            "000000",
            "--width",
            "640",
        ])
        .unwrap();

        assert_eq!(cli.options.feed.as_deref(), Some("feed.xml"));
        assert_eq!(cli.options.fg.as_deref(), Some("000000"));
        assert_eq!(cli.options.width, Some(640));
        match cli.command {
            Commands::Publish { number, yes } => {
                assert_eq!(number, Some(7));
                assert!(yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_render_default_output() {
        let cli = Cli::try_parse_from(["podcast2video", "render", "3"]).unwrap();
        match cli.command {
            Commands::Render { number, output } => {
                assert_eq!(number, 3);
                assert_eq!(output, PathBuf::from("slide.png"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
