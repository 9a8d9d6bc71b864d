use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::hash::compute_twt_hash;

pub const EMPTY_FEED_MESSAGE: &str = "No valid entries found in this feed.";

/// One logical post of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub author: String,
    /// Kept verbatim; see [`TimelineEntry::published_at`].
    pub timestamp: String,
    /// Message body with the subject marker and inline hash tag removed.
    pub raw_message: String,
    pub hash: Option<String>,
    pub reply_subject: Option<String>,
    /// 1-based source line of the post header.
    pub line: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
    /// The message exactly as written after the timestamp; hashed as is.
    #[serde(skip)]
    source_text: String,
}

impl TimelineEntry {
    pub fn new(author: impl Into<String>, timestamp: impl Into<String>, raw_message: impl Into<String>) -> Self {
        let raw_message = raw_message.into();
        Self {
            author: author.into(),
            timestamp: timestamp.into(),
            source_text: raw_message.clone(),
            raw_message,
            hash: None,
            reply_subject: None,
            line: 0,
            placeholder: false,
        }
    }

    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = text.into();
        self
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// The stand-in entry returned when a feed yields nothing parseable.
    pub fn placeholder(author: impl Into<String>) -> Self {
        Self {
            placeholder: true,
            ..Self::new(author, "", EMPTY_FEED_MESSAGE)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Parse the opaque timestamp for display and sorting.
    ///
    /// Accepts RFC 3339, RFC 3339 without seconds, and offset-less ISO 8601
    /// (read as UTC).
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// The declared hash, or the Hash Extension hash of the text as
    /// written, computed against `feed_url`.
    pub fn computed_hash(&self, feed_url: &str) -> String {
        match &self.hash {
            Some(hash) => hash.clone(),
            None => compute_twt_hash(feed_url, &self.timestamp, &self.source_text),
        }
    }
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// Emitted alongside the placeholder entry when a parse finds no entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResultNotice {
    pub skipped_lines: usize,
}
