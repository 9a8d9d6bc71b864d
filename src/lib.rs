//! # twtfeed
//!
//! A reader for [twtxt](https://twtxt.readthedocs.io/) feeds.
//!
//! ## Architecture
//!
//! twtfeed follows a pipeline architecture:
//!
//! ```text
//! Fetcher → Tokenizer → {Metadata Extractor, Entry Parser} → Formatter → UI
//! ```
//!
//! - [`fetcher`]: Retrieves feed bytes from a URL or a local path, cancellably
//! - [`parser`]: Splits a feed into metadata and entries, tolerating bad lines
//! - [`formatter`]: Turns message bodies into links, mentions and images
//!
//! ## Quick Start
//!
//! ```bash
//! # Show a single feed
//! twtfeed view https://example.com/twtxt.txt
//!
//! # Show your feed and everyone you follow
//! twtfeed timeline
//!
//! # Compute a twt hash
//! twtfeed hash https://example.com/twtxt.txt 2024-01-01T00:00:00Z "Hello"
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Configuration loading
//! - [`domain`]: Core domain models (FeedMetadata, TimelineEntry, FormattedMessage)
//! - [`fetcher`]: Local and HTTP fetching
//! - [`formatter`]: Message formatting and rendering
//! - [`parser`]: Feed parsing

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the fetchers,
/// the parser and the configuration.
pub mod app;

/// Command-line interface using clap.
///
/// - `view <source>` - Fetch and show one feed
/// - `timeline` - Merge your feed with everything you follow
/// - `hash <url> <timestamp> <text>` - Compute a twt hash
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/twtfeed/config.toml`: your own feed, the feeds
/// you follow, and fetch settings.
pub mod config;

/// Core domain models.
///
/// - [`FeedMetadata`](domain::FeedMetadata): Nick, avatar, follows, links
/// - [`TimelineEntry`](domain::TimelineEntry): One post, with reply subject and hash
/// - [`FormattedMessage`](domain::FormattedMessage): Spans and images of a message
pub mod domain;

/// Feed fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`LocalFetcher`](fetcher::LocalFetcher): Filesystem implementation
/// - [`ParallelFetcher`](fetcher::ParallelFetcher): Concurrent fetch and parse with semaphore
pub mod fetcher;

/// Message formatting.
///
/// Detects links, images and mentions, and renders to HTML or plain text.
pub mod formatter;

/// Feed parsing.
///
/// Tokenizes a feed, extracts `# key = value` metadata, and parses posts in
/// both the tab-separated and the `user (timestamp): message` shapes.
pub mod parser;
