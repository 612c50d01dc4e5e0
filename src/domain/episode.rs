//! A single feed entry selected for processing.

use serde::{Deserialize, Serialize};

/// One podcast episode as read from the feed.
///
/// Built once by the feed locator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Display title
    pub title: String,

    /// Ordinal number, the selection key within the feed
    pub number: u32,

    /// Canonical URL of the episode's web page
    pub link: String,

    /// Raw description, may contain inline markup
    pub description: String,

    /// Location of the audio asset
    pub audio_url: String,

    /// Category labels in feed order (duplicates kept)
    pub tags: Vec<String>,
}

impl Episode {
    /// Text drawn on the title card: `"<number>: <title>"`
    pub fn card_text(&self) -> String {
        format!("{}: {}", self.number, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_text() {
        let episode = Episode {
            title: "Launch".to_string(),
            number: 42,
            link: String::new(),
            description: String::new(),
            audio_url: String::new(),
            tags: vec![],
        };
        assert_eq!(episode.card_text(), "42: Launch");
    }
}
