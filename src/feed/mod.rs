//! Feed locator.
//!
//! Retrieves a podcast RSS document and picks the episode with a given
//! ordinal number:
//!
//! ```text
//! FeedSource → fetch_document → parse_items → first item with order == number
//! ```

pub mod parser;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Episode;

pub use parser::{parse_items, FeedItem};

/// Errors from locating an episode
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not get {source_name}: {cause}")]
    Fetch {
        source_name: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not decode feed: {message}")]
    Parse { message: String },

    #[error("could not find episode {number}")]
    NotFound { number: u32 },
}

/// Where the feed document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Fetched with an HTTP GET
    Url(String),

    /// Read from the local filesystem
    File(PathBuf),
}

impl FeedSource {
    /// Classify a location string: `http://` and `https://` are URLs,
    /// anything else is a file path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Retrieve the raw feed document
pub async fn fetch_document(
    client: &reqwest::Client,
    source: &FeedSource,
) -> Result<String, FeedError> {
    let fetch_err = |cause: Box<dyn std::error::Error + Send + Sync>| FeedError::Fetch {
        source_name: source.to_string(),
        cause,
    };

    match source {
        FeedSource::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| fetch_err(Box::new(e)))?;
            response.text().await.map_err(|e| fetch_err(Box::new(e)))
        }
        FeedSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| fetch_err(Box::new(e))),
    }
}

/// Find the first item whose order equals `number`, in document order.
pub fn find_episode(xml: &str, number: u32) -> Result<Episode, FeedError> {
    let items = parse_items(xml)?;
    debug!(items = items.len(), "Parsed feed items");

    items
        .into_iter()
        .find(|item| item.order == Some(i64::from(number)))
        .map(|item| item.into_episode(number))
        .ok_or(FeedError::NotFound { number })
}

/// Fetch the feed and return the episode with the given number
pub async fn locate_episode(
    client: &reqwest::Client,
    source: &FeedSource,
    number: u32,
) -> Result<Episode, FeedError> {
    let xml = fetch_document(client, source).await?;
    let episode = find_episode(&xml, number)?;
    info!(number, title = %episode.title, "Located episode");
    Ok(episode)
}
