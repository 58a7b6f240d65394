//! Archive entry data structures.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static VIDEO_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").ok());

/// One archived item listed by the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Store-issued identifier, unique within a catalog snapshot
    pub id: String,

    /// Display title (may be empty)
    #[serde(default)]
    pub title: String,

    /// ISO-8601 date (`YYYY-MM-DD`, possibly followed by a time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Optional media URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,

    /// Raw property bag, keyed by property name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Entry {
    /// Create an entry with only an id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date: None,
            media_ref: None,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style date setter.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Builder-style media setter.
    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        self.media_ref = Some(url.into());
        self
    }

    /// Date used for ordering; entries without a date sort as the empty string.
    pub fn sort_key(&self) -> &str {
        self.date.as_deref().unwrap_or("")
    }

    /// The `YYYY-MM` bucket this entry belongs to.
    pub fn month_key(&self) -> Option<&str> {
        self.date.as_deref().map(|d| d.get(..7).unwrap_or(d))
    }

    /// YouTube video id referenced by `media_ref`, if any.
    pub fn video_id(&self) -> Option<&str> {
        let url = self.media_ref.as_deref()?;
        let pattern = (*VIDEO_ID).as_ref()?;
        pattern.captures(url)?.get(1).map(|m| m.as_str())
    }

    /// Medium-quality thumbnail for the referenced video.
    pub fn thumbnail_url(&self) -> Option<String> {
        self.video_id()
            .map(|id| format!("https://img.youtube.com/vi/{id}/mqdefault.jpg"))
    }
}

/// A typed property value from the store's property bag.
///
/// Only the kinds the archive can reason about are modelled; anything else
/// decodes to [`PropertyValue::Unsupported`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        text: String,
    },
    RichText {
        text: String,
    },
    Date {
        start: Option<String>,
        end: Option<String>,
    },
    Url {
        url: Option<String>,
    },
    Number {
        value: Option<f64>,
    },
    Select {
        name: Option<String>,
    },
    MultiSelect {
        names: Vec<String>,
    },
    Checkbox {
        value: bool,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    /// Plain text carried by title and rich-text properties.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Title { text } | Self::RichText { text } => Some(text),
            _ => None,
        }
    }

    /// Start date of a date property.
    pub fn as_date(&self) -> Option<&str> {
        match self {
            Self::Date { start, .. } => start.as_deref(),
            _ => None,
        }
    }

    /// URL of a url property.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url { url } => url.as_deref(),
            _ => None,
        }
    }
}
