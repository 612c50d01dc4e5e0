//! Publish metadata derived from an episode.
//!
//! Title comes from a two-slot template, the description links back to the
//! original post and carries the episode notes with markup removed, and the
//! tags are the episode's categories plus a fixed set of extra labels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Episode;

/// Labels appended to every episode's tags unless configured otherwise
pub const DEFAULT_EXTRA_TAGS: [&str; 2] = ["gcppodcast", "podcast"];

/// Title, description and tags handed to the publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl PublishMetadata {
    /// Derive the publish metadata for an episode
    pub fn derive(episode: &Episode, template: &TitleTemplate, extra_tags: &[String]) -> Self {
        let title = template.expand(&episode.title, episode.number);

        let description = format!(
            "Original post: {}\n\n{}",
            episode.link,
            strip_markup(&episode.description)
        );

        let mut tags = episode.tags.clone();
        tags.extend(extra_tags.iter().cloned());

        Self {
            title,
            description,
            tags,
        }
    }
}

/// Errors from parsing a title template
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("title template {template:?} has {found} substitution slots, expected 2")]
    SlotCount { template: String, found: usize },

    #[error("title template {template:?} has unsupported verb '%{verb}'")]
    UnsupportedVerb { template: String, verb: char },

    #[error("title template {template:?} ends with a lone '%'")]
    TrailingPercent { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot,
}

/// A title template with two slots, filled with the episode title and then
/// the episode number.
///
/// Slots are written `%s`, `%d` or `%v`; `%%` is a literal percent sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleTemplate {
    segments: Vec<Segment>,
}

impl TitleTemplate {
    /// Parse and validate a template
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut slots = 0usize;
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some('s') | Some('d') | Some('v') => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot);
                    slots += 1;
                }
                Some(verb) => {
                    return Err(TemplateError::UnsupportedVerb {
                        template: template.to_string(),
                        verb,
                    })
                }
                None => {
                    return Err(TemplateError::TrailingPercent {
                        template: template.to_string(),
                    })
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if slots != 2 {
            return Err(TemplateError::SlotCount {
                template: template.to_string(),
                found: slots,
            });
        }

        Ok(Self { segments })
    }

    /// Fill the slots with `title` and `number`, in that order
    pub fn expand(&self, title: &str, number: u32) -> String {
        let number = number.to_string();
        let mut values = [title, number.as_str()].into_iter();
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot => out.push_str(values.next().unwrap_or_default()),
            }
        }
        out
    }
}

/// Remove inline markup tags and collapse newlines to spaces.
///
/// Uses a single in-tag flag: `<` enters a tag, `>` leaves it. There is no
/// attribute or entity handling, and an unmatched `<` drops everything after
/// it.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' if !in_tag => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Episode {
        Episode {
            title: "Test".to_string(),
            number: 5,
            link: "http://x/5".to_string(),
            description: "<p>Hi</p>".to_string(),
            audio_url: "http://x/5.mp3".to_string(),
            tags: vec!["a".to_string()],
        }
    }

    fn default_extra_tags() -> Vec<String> {
        DEFAULT_EXTRA_TAGS.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_strip_markup_removes_tags() {
        assert_eq!(strip_markup("a<b>c</b>d"), "acd");
    }

    #[test]
    fn test_strip_markup_collapses_newlines() {
        assert_eq!(strip_markup("line1\nline2"), "line1 line2");
        assert_eq!(strip_markup("<p>one</p>\n<p>two</p>"), "one two");
    }

    #[test]
    fn test_strip_markup_unterminated_tag_swallows_rest() {
        assert_eq!(strip_markup("x<unterminated"), "x");
        assert_eq!(strip_markup("keep <a href='x'>link</a> and < more"), "keep link and ");
    }

    #[test]
    fn test_strip_markup_keeps_stray_closing_bracket() {
        assert_eq!(strip_markup("a > b"), "a > b");
    }

    #[test]
    fn test_title_template_expansion() {
        let template = TitleTemplate::parse("%s: Ep %d").unwrap();
        assert_eq!(template.expand("Launch", 42), "Launch: Ep 42");
    }

    #[test]
    fn test_title_template_literal_percent() {
        let template = TitleTemplate::parse("100%% %s #%v").unwrap();
        assert_eq!(template.expand("Done", 7), "100% Done #7");
    }

    #[test]
    fn test_title_template_rejects_wrong_slot_count() {
        assert_eq!(
            TitleTemplate::parse("%s only"),
            Err(TemplateError::SlotCount {
                template: "%s only".to_string(),
                found: 1
            })
        );
        assert!(TitleTemplate::parse("%s %d %s").is_err());
        assert!(TitleTemplate::parse("%s %q").is_err());
        assert!(TitleTemplate::parse("%s %d %").is_err());
    }

    #[test]
    fn test_derive_metadata() {
        let template = TitleTemplate::parse("%s: GCPPodcast %d").unwrap();
        let metadata = PublishMetadata::derive(&episode(), &template, &default_extra_tags());

        assert_eq!(metadata.title, "Test: GCPPodcast 5");
        assert_eq!(metadata.description, "Original post: http://x/5\n\nHi");
        assert_eq!(metadata.tags, vec!["a", "gcppodcast", "podcast"]);
    }

    #[test]
    fn test_derive_metadata_keeps_duplicate_tags() {
        let mut ep = episode();
        ep.tags = vec!["podcast".to_string(), "podcast".to_string()];
        let template = TitleTemplate::parse("%s %d").unwrap();
        let metadata = PublishMetadata::derive(&ep, &template, &default_extra_tags());

        assert_eq!(
            metadata.tags,
            vec!["podcast", "podcast", "gcppodcast", "podcast"]
        );
    }
}
