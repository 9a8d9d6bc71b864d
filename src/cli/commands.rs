use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Serialize;

use crate::app::{AppContext, Result};
use crate::cli::OutputFormat;
use crate::domain::{compute_twt_hash, FeedMetadata, FormattedMessage, TimelineEntry};
use crate::fetcher::{FeedRequest, FeedSource};
use crate::formatter::format_message;
use crate::parser::{FeedContext, LineParseWarning, ParsedFeed};

const REPLY_EXCERPT_CHARS: usize = 60;

/// An entry ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedEntry {
    #[serde(flatten)]
    pub entry: TimelineEntry,
    /// Declared or computed hash; `None` when the feed URL is unknown.
    pub twt_hash: Option<String>,
    pub formatted: FormattedMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyContext {
    pub author: String,
    pub excerpt: String,
}

#[derive(Serialize)]
struct FeedView<'a> {
    source: String,
    metadata: &'a FeedMetadata,
    entries: Vec<RenderedEntry>,
    warnings: &'a [LineParseWarning],
}

pub async fn view_feed(
    ctx: &AppContext,
    source: &str,
    label: Option<String>,
    format: OutputFormat,
    show_warnings: bool,
) -> Result<()> {
    let source = FeedSource::parse(source)?;

    let mut context = FeedContext::new();
    if let Some(url) = source.url() {
        context = context.with_url(url);
    }
    if let Some(label) = label {
        context = context.with_label(label);
    }

    let request = FeedRequest::new(source, context);
    let feed = ctx.load_feed(&request).await?;
    let entries = render_entries(&[(request.clone(), feed.clone())]);

    match format {
        OutputFormat::Json => {
            let view = FeedView {
                source: request.source.to_string(),
                metadata: &feed.metadata,
                entries,
                warnings: &feed.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Html => {
            for rendered in &entries {
                println!("{}", render_html(rendered));
            }
        }
        OutputFormat::Text => {
            print_metadata(&feed.metadata);
            for rendered in &entries {
                println!("{}", render_text(rendered));
            }
            if show_warnings {
                for warning in &feed.warnings {
                    eprintln!("  skipped {}", warning);
                }
            } else if !feed.warnings.is_empty() {
                eprintln!(
                    "{} line(s) skipped; use --warnings to list them",
                    feed.warnings.len()
                );
            }
        }
    }

    Ok(())
}

pub async fn show_timeline(ctx: &AppContext, limit: usize, format: OutputFormat) -> Result<()> {
    let mut requests: Vec<FeedRequest> = ctx.own_feed_request().into_iter().collect();
    requests.extend(ctx.following_requests());

    if requests.is_empty() {
        println!("Nothing to show: configure twtxt.path or add [[following]] feeds");
        return Ok(());
    }

    tracing::info!("Fetching {} feeds", requests.len());

    let results = ctx.parallel_fetcher.fetch_all(requests, &ctx.cancel).await;

    let mut feeds = Vec::new();
    let mut errors = 0;
    for (request, result) in results {
        match result {
            Ok(feed) => feeds.push((request, feed)),
            Err(e) => {
                errors += 1;
                eprintln!("  Error fetching {}: {}", request.source, e);
            }
        }
    }

    let mut entries = render_entries(&feeds);
    entries.truncate(limit);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Html => {
            for rendered in &entries {
                println!("{}", render_html(rendered));
            }
        }
        OutputFormat::Text => {
            for rendered in &entries {
                println!("{}", render_text(rendered));
            }
            println!("{} entries from {} feeds, {} errors", entries.len(), feeds.len(), errors);
        }
    }

    Ok(())
}

pub fn hash_entry(url: &str, timestamp: &str, text: &str) {
    println!("{}", compute_twt_hash(url, timestamp, text));
}

/// Render the entries of one or more feeds, linking replies to the entries
/// they answer. With several feeds the result is sorted newest first and
/// placeholders of empty feeds are dropped; a single feed keeps its order.
pub fn render_entries(feeds: &[(FeedRequest, ParsedFeed)]) -> Vec<RenderedEntry> {
    let mut rendered = Vec::new();

    for (request, feed) in feeds {
        let feed_url = request.context.url.as_deref().or(feed.metadata.url.as_deref());

        for entry in &feed.entries {
            if entry.is_placeholder() && feeds.len() > 1 {
                continue;
            }
            rendered.push(RenderedEntry {
                twt_hash: match (&entry.hash, feed_url) {
                    (Some(hash), _) => Some(hash.clone()),
                    (None, Some(url)) if !entry.is_placeholder() => Some(entry.computed_hash(url)),
                    _ => None,
                },
                formatted: format_message(&entry.raw_message, Some(&feed.metadata)),
                entry: entry.clone(),
                reply_to: None,
            });
        }
    }

    let by_hash: HashMap<String, ReplyContext> = rendered
        .iter()
        .filter_map(|r| {
            r.twt_hash.clone().map(|hash| {
                (
                    hash,
                    ReplyContext {
                        author: r.entry.author.clone(),
                        excerpt: excerpt(&r.formatted.to_plain_text()),
                    },
                )
            })
        })
        .collect();

    for item in &mut rendered {
        if let Some(subject) = &item.entry.reply_subject {
            item.reply_to = by_hash.get(subject).cloned();
        }
    }

    if feeds.len() > 1 {
        rendered.sort_by_key(|r| Reverse(r.entry.published_at()));
    }

    rendered
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > REPLY_EXCERPT_CHARS {
        let cut: String = flat.chars().take(REPLY_EXCERPT_CHARS).collect();
        format!("{}…", cut)
    } else {
        flat
    }
}

fn print_metadata(metadata: &FeedMetadata) {
    if let Some(nick) = &metadata.nick {
        println!("{}", nick);
    }
    if let Some(description) = &metadata.description {
        println!("  {}", description);
    }
    if let Some(url) = &metadata.url {
        println!("  {}", url);
    }
    for link in &metadata.links {
        println!("  {}: {}", link.display_text(), link.url);
    }
    if !metadata.follows.is_empty() {
        println!("  following {}", metadata.follows.len());
    }
    println!();
}

pub fn render_text(rendered: &RenderedEntry) -> String {
    let entry = &rendered.entry;
    if entry.is_placeholder() {
        return entry.raw_message.clone();
    }

    let when = entry
        .published_at()
        .map(|dt| dt.with_timezone(&chrono::Local).format("%b %-d %Y %-I:%M %p").to_string())
        .unwrap_or_else(|| entry.timestamp.clone());

    let mut out = format!("{} · {}", entry.author, when);
    if let Some(hash) = &rendered.twt_hash {
        out.push_str(&format!(" #{}", hash));
    }
    out.push('\n');

    match (&rendered.reply_to, &entry.reply_subject) {
        (Some(reply), _) => out.push_str(&format!("  ↳ reply to {}: {}\n", reply.author, reply.excerpt)),
        (None, Some(subject)) => out.push_str(&format!("  ↳ reply to #{}\n", subject)),
        (None, None) => {}
    }

    for line in rendered.formatted.to_plain_text().lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    for image in &rendered.formatted.images {
        out.push_str(&format!("  [image] {}\n", image));
    }

    out
}

fn render_html(rendered: &RenderedEntry) -> String {
    format!(
        "<article class=\"twt\"><header>{} {}</header>{}</article>",
        html_escape::encode_text(&rendered.entry.author),
        html_escape::encode_text(&rendered.entry.timestamp),
        rendered.formatted.to_html()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FeedParser;

    fn feed(url: &str, body: &str) -> (FeedRequest, ParsedFeed) {
        let request = FeedRequest::new(
            FeedSource::parse(url).unwrap(),
            FeedContext::new().with_url(url),
        );
        let parsed = FeedParser::new().parse(body.as_bytes(), &request.context);
        (request, parsed)
    }

    #[test]
    fn test_render_entries_sorted_newest_first() {
        let feeds = vec![
            feed("https://a.example/twtxt.txt", "# nick = alice\n2024-01-01T00:00:00Z\told\n"),
            feed("https://b.example/twtxt.txt", "# nick = bob\n2024-02-01T00:00:00Z\tnew\n"),
        ];

        let entries = render_entries(&feeds);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry.author, "bob");
        assert_eq!(entries[1].entry.author, "alice");
    }

    #[test]
    fn test_render_entries_links_replies() {
        let original = feed("https://a.example/twtxt.txt", "# nick = alice\n2024-01-01T00:00:00Z\tHello world\n");
        let hash = original.1.entries[0].computed_hash("https://a.example/twtxt.txt");
        let reply_body = format!("# nick = bob\n2024-01-02T00:00:00Z\t(#{}) hi alice\n", hash);
        let reply = feed("https://b.example/twtxt.txt", &reply_body);

        let entries = render_entries(&[original, reply]);
        let bob = entries.iter().find(|e| e.entry.author == "bob").unwrap();

        assert_eq!(
            bob.reply_to,
            Some(ReplyContext {
                author: "alice".into(),
                excerpt: "Hello world".into(),
            })
        );
    }

    #[test]
    fn test_render_entries_drops_placeholders_when_merging() {
        let feeds = vec![
            feed("https://a.example/twtxt.txt", "# nick = alice\n"),
            feed("https://b.example/twtxt.txt", "2024-02-01T00:00:00Z\tnew\n"),
        ];
        let entries = render_entries(&feeds);
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].entry.is_placeholder());
    }

    #[test]
    fn test_single_feed_keeps_placeholder_and_order() {
        let feeds = vec![feed("https://a.example/twtxt.txt", "# nick = alice\n")];
        let entries = render_entries(&feeds);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].entry.is_placeholder());
        assert_eq!(entries[0].twt_hash, None);
        assert_eq!(render_text(&entries[0]), crate::domain::entry::EMPTY_FEED_MESSAGE);
    }

    #[test]
    fn test_render_text_shows_images_and_hash() {
        let feeds = vec![feed(
            "https://a.example/twtxt.txt",
            "# nick = alice\n2024-01-01T00:00:00Z\tcheck this https://example.com/cat.png out [#k7zq2ma]\n",
        )];
        let entries = render_entries(&feeds);
        let text = render_text(&entries[0]);

        assert!(text.starts_with("alice · "));
        assert!(text.contains("#k7zq2ma"));
        assert!(text.contains("  check this https://example.com/cat.png out\n"));
        assert!(text.contains("  [image] https://example.com/cat.png\n"));
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "word ".repeat(30);
        let short = excerpt(&long);
        assert!(short.ends_with('…'));
        assert_eq!(short.chars().count(), REPLY_EXCERPT_CHARS + 1);
        assert_eq!(excerpt("a\n b"), "a b");
    }
}
