use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A `text url` pair from a `follow` or `link` metadata line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

impl Link {
    /// Parse a `text url` value. The url is the last whitespace-separated
    /// token; everything before it is the text, which may be empty.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (text, url) = match value.rsplit_once(char::is_whitespace) {
            Some((text, url)) => (text.trim(), url.trim()),
            None => ("", value),
        };

        if url.is_empty() {
            return None;
        }

        Some(Self {
            text: text.to_string(),
            url: url.to_string(),
        })
    }

    pub fn display_text(&self) -> &str {
        if self.text.is_empty() {
            &self.url
        } else {
            &self.text
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    User,
    Bot,
    Rss,
}

impl FeedKind {
    /// Unrecognized values fall back to [`FeedKind::User`].
    pub fn from_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "bot" => Self::Bot,
            "rss" => Self::Rss,
            _ => Self::User,
        }
    }
}

/// Feed-level metadata declared in `# key = value` comment lines.
///
/// Rebuilt from scratch on every parse; a re-fetch replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedMetadata {
    pub nick: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
    /// First declared `url`.
    pub url: Option<String>,
    /// Every declared `url`, in order.
    pub urls: Vec<String>,
    pub kind: FeedKind,
    /// Refresh interval in seconds.
    pub refresh: Option<u64>,
    pub prev: Option<String>,
    pub follows: Vec<Link>,
    /// Declared follow count. Informational only; `follows` is authoritative.
    pub following: Option<u64>,
    pub links: Vec<Link>,
}

impl FeedMetadata {
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh.map(Duration::from_secs)
    }

    /// Look up a followed feed by nick, case-insensitively.
    pub fn follow_by_nick(&self, nick: &str) -> Option<&Link> {
        self.follows
            .iter()
            .find(|link| !link.text.is_empty() && link.text.eq_ignore_ascii_case(nick))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
