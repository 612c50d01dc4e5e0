//! RSS item extraction with `quick-xml`.
//!
//! Only direct children of `<item>` inside the first `<channel>` are read,
//! matched by local name so `itunes:order` and `order` are the same field.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::FeedError;
use crate::domain::Episode;

/// Raw fields of one `<item>`, before ordinal selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub order: Option<i64>,
    pub guid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub enclosure_url: String,
    pub categories: Vec<String>,
}

impl FeedItem {
    /// Convert into an episode with the given number
    pub fn into_episode(self, number: u32) -> Episode {
        Episode {
            title: self.title,
            number,
            link: self.guid,
            description: self.summary.or(self.description).unwrap_or_default(),
            audio_url: self.enclosure_url,
            tags: self.categories,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Order,
    Guid,
    Summary,
    Description,
    Category,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"order" => Some(Self::Order),
            b"guid" => Some(Self::Guid),
            b"summary" => Some(Self::Summary),
            b"description" => Some(Self::Description),
            b"category" => Some(Self::Category),
            _ => None,
        }
    }
}

/// Parser position relative to the first channel's items
#[derive(Debug, Default)]
struct ParseState {
    depth: usize,
    saw_root: bool,
    channel_depth: Option<usize>,
    channel_done: bool,
    item_depth: Option<usize>,
    field: Option<(Field, usize)>,
    text: String,
    current: FeedItem,
}

/// Parse every item of the first channel, in document order.
pub fn parse_items(xml: &str) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut state = ParseState::default();
    let mut items = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| FeedError::Parse {
            message: format!("malformed XML at byte {}: {}", reader.buffer_position(), e),
        })?;

        match event {
            Event::Start(ref e) => {
                state.open(e, false)?;
            }
            Event::Empty(ref e) => {
                state.open(e, true)?;
            }
            Event::End(_) => {
                if let Some(item) = state.close()? {
                    items.push(item);
                }
            }
            Event::Text(ref t) => {
                if state.in_field_text() {
                    let text = t.unescape().map_err(|e| FeedError::Parse {
                        message: format!("invalid text content: {}", e),
                    })?;
                    state.text.push_str(&text);
                }
            }
            Event::CData(t) => {
                if state.in_field_text() {
                    state.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if state.depth != 0 {
        return Err(FeedError::Parse {
            message: "document ended inside an open element".to_string(),
        });
    }
    if !state.saw_root {
        return Err(FeedError::Parse {
            message: "document has no <rss> root element".to_string(),
        });
    }
    if state.channel_depth.is_none() && !state.channel_done {
        return Err(FeedError::Parse {
            message: "feed has no <channel> element".to_string(),
        });
    }

    Ok(items)
}

impl ParseState {
    /// Character data directly inside a field; text of nested elements is skipped.
    fn in_field_text(&self) -> bool {
        matches!(self.field, Some((_, field_depth)) if field_depth == self.depth)
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), FeedError> {
        let local = e.local_name();
        let name = local.as_ref();
        let depth = self.depth + 1;

        if self.depth == 0 {
            if name != b"rss" {
                return Err(FeedError::Parse {
                    message: format!(
                        "expected <rss> root element, found <{}>",
                        String::from_utf8_lossy(name)
                    ),
                });
            }
            self.saw_root = true;
        } else if depth == 2 && name == b"channel" && self.channel_depth.is_none() && !self.channel_done {
            self.channel_depth = Some(depth);
        } else if let Some(channel_depth) = self.channel_depth {
            if depth == channel_depth + 1 && name == b"item" {
                self.item_depth = Some(depth);
                self.current = FeedItem::default();
            } else if let Some(item_depth) = self.item_depth {
                if depth == item_depth + 1 {
                    if name == b"enclosure" {
                        self.current.enclosure_url = enclosure_url(e)?;
                    } else if let Some(field) = Field::from_local_name(name) {
                        self.field = Some((field, depth));
                        self.text.clear();
                    }
                }
            }
        }

        if empty {
            // A self-closing field still counts, with empty content.
            if let Some((field, field_depth)) = self.field {
                if field_depth == depth {
                    self.field = None;
                    self.store(field)?;
                }
            }
            if self.item_depth == Some(depth) {
                self.item_depth = None;
            }
            if self.channel_depth == Some(depth) {
                self.channel_depth = None;
                self.channel_done = true;
            }
        } else {
            self.depth = depth;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<Option<FeedItem>, FeedError> {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);

        if let Some((field, field_depth)) = self.field {
            if field_depth == depth {
                self.field = None;
                self.store(field)?;
                return Ok(None);
            }
        }

        if self.item_depth == Some(depth) {
            self.item_depth = None;
            return Ok(Some(std::mem::take(&mut self.current)));
        }

        if self.channel_depth == Some(depth) {
            self.channel_depth = None;
            self.channel_done = true;
        }
        Ok(None)
    }

    fn store(&mut self, field: Field) -> Result<(), FeedError> {
        let text = std::mem::take(&mut self.text);
        match field {
            Field::Title => self.current.title = text,
            Field::Guid => self.current.guid = text,
            Field::Summary => self.current.summary = Some(text),
            Field::Description => self.current.description = Some(text),
            Field::Category => self.current.categories.push(text),
            Field::Order => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(());
                }
                let order = trimmed.parse::<i64>().map_err(|_| FeedError::Parse {
                    message: format!("item order {:?} is not an integer", trimmed),
                })?;
                self.current.order = Some(order);
            }
        }
        Ok(())
    }
}

fn enclosure_url(e: &BytesStart<'_>) -> Result<String, FeedError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| FeedError::Parse {
            message: format!("invalid enclosure attribute: {}", err),
        })?;
        if attr.key.local_name().as_ref() == b"url" {
            let value = attr.unescape_value().map_err(|err| FeedError::Parse {
                message: format!("invalid enclosure url: {}", err),
            })?;
            return Ok(value.into_owned());
        }
    }
    Ok(String::new())
}
