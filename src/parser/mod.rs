pub mod entry;
pub mod metadata;
pub mod tokenizer;

use serde::Serialize;
use url::Url;

use crate::domain::{EmptyResultNotice, FeedMetadata, TimelineEntry};

pub use entry::{LineOutcome, LineParseWarning, ParsedEntries, SkipReason};
pub use tokenizer::{tokenize, Token, TokenKind};

pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Where a feed came from and how its entries should be labelled.
#[derive(Debug, Clone, Default)]
pub struct FeedContext {
    /// URL the feed was fetched from.
    pub url: Option<String>,
    /// Caller-supplied label, e.g. from the following list.
    pub label: Option<String>,
    /// Use `label` even when the feed declares its own nick.
    pub prefer_label: bool,
}

impl FeedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn prefer_label(mut self, prefer: bool) -> Self {
        self.prefer_label = prefer;
        self
    }

    /// Label override, then declared nick, then URL host, then label.
    pub fn resolve_author(&self, metadata: &FeedMetadata) -> String {
        let label = self.label.as_deref().filter(|l| !l.is_empty());

        if self.prefer_label {
            if let Some(label) = label {
                return label.to_string();
            }
        }

        metadata
            .nick
            .clone()
            .or_else(|| {
                self.url
                    .as_deref()
                    .and_then(|u| Url::parse(u).ok())
                    .and_then(|u| u.host_str().map(str::to_string))
            })
            .or_else(|| label.map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }
}

/// Result of one full parse of a feed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFeed {
    pub metadata: FeedMetadata,
    pub entries: Vec<TimelineEntry>,
    pub warnings: Vec<LineParseWarning>,
    pub empty_notice: Option<EmptyResultNotice>,
}

impl ParsedFeed {
    /// True when the feed had no parseable entries and `entries` holds only
    /// the placeholder.
    pub fn is_empty(&self) -> bool {
        self.empty_notice.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &[u8], ctx: &FeedContext) -> ParsedFeed {
        let tokens = tokenize(body);
        let metadata = metadata::extract(&tokens);
        let author = ctx.resolve_author(&metadata);

        let ParsedEntries {
            entries,
            warnings,
            empty_notice,
        } = entry::parse_entries(&tokens, &author);

        let source = ctx.url.as_deref().unwrap_or("<local>");
        tracing::debug!(
            source,
            entries = entries.len(),
            skipped = warnings.len(),
            "parsed feed"
        );
        if !warnings.is_empty() {
            tracing::warn!(source, skipped = warnings.len(), "skipped malformed lines");
        }

        ParsedFeed {
            metadata,
            entries,
            warnings,
            empty_notice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedKind;

    const SAMPLE_FEED: &str = "\
# nick        = alice
# url         = https://alice.example/twtxt.txt
# avatar      = https://alice.example/avatar.png
# description = Rust and tea
# follow      = jane https://j.example/twtxt.txt
# following   = 2
# refresh     = 600

2024-01-01T10:00:00Z\tHello twtxt!
2024-01-02T10:00:00Z\t(#abc2345) @<jane https://j.example/twtxt.txt> agreed
this continues the reply
2024-01-03T10:00:00Z\tcheck this https://example.com/cat.png out
";

    #[test]
    fn test_parse_full_feed() {
        let parser = FeedParser::new();
        let feed = parser.parse(
            SAMPLE_FEED.as_bytes(),
            &FeedContext::new().with_url("https://alice.example/twtxt.txt"),
        );

        assert_eq!(feed.metadata.nick.as_deref(), Some("alice"));
        assert_eq!(feed.metadata.kind, FeedKind::User);
        assert_eq!(feed.metadata.refresh, Some(600));
        assert_eq!(feed.metadata.follows.len(), 1);
        assert_eq!(feed.metadata.following, Some(2));

        assert_eq!(feed.entries.len(), 3);
        assert!(feed.warnings.is_empty());
        assert!(!feed.is_empty());

        let reply = &feed.entries[1];
        assert_eq!(reply.author, "alice");
        assert_eq!(reply.reply_subject.as_deref(), Some("abc2345"));
        assert_eq!(
            reply.raw_message,
            "@<jane https://j.example/twtxt.txt> agreed\nthis continues the reply"
        );
    }

    #[test]
    fn test_parse_is_repeatable() {
        let parser = FeedParser::new();
        let ctx = FeedContext::new();
        assert_eq!(
            parser.parse(SAMPLE_FEED.as_bytes(), &ctx),
            parser.parse(SAMPLE_FEED.as_bytes(), &ctx)
        );
    }

    #[test]
    fn test_metadata_only_feed() {
        let feed = FeedParser::new().parse(b"# nick = quiet\n", &FeedContext::new());

        assert!(feed.is_empty());
        assert_eq!(feed.entries.len(), 1);
        assert!(feed.entries[0].is_placeholder());
        assert_eq!(feed.entries[0].author, "quiet");
    }

    #[test]
    fn test_empty_document() {
        let feed = FeedParser::new().parse(b"", &FeedContext::new());
        assert!(feed.metadata.is_empty());
        assert!(feed.is_empty());
        assert_eq!(feed.entries[0].author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_resolve_author_order() {
        let meta = FeedMetadata {
            nick: Some("alice".into()),
            ..Default::default()
        };
        let empty = FeedMetadata::default();

        let ctx = FeedContext::new()
            .with_url("https://host.example/twtxt.txt")
            .with_label("Ally");

        assert_eq!(ctx.resolve_author(&meta), "alice");
        assert_eq!(ctx.resolve_author(&empty), "host.example");
        assert_eq!(ctx.clone().prefer_label(true).resolve_author(&meta), "Ally");
        assert_eq!(FeedContext::new().with_label("Ally").resolve_author(&empty), "Ally");
        assert_eq!(FeedContext::new().resolve_author(&empty), UNKNOWN_AUTHOR);
    }
}
