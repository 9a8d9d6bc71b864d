//! Turns a message body into spans of text, links and mentions.
//!
//! Pure and stateless: the same input always yields the same output, and
//! URLs that fail to parse degrade to plain links rather than errors.

mod render;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use crate::domain::{FeedMetadata, FormattedMessage, Span};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

/// Characters dropped from the end of a detected URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<mention>@<(?P<first>[^\s>]+)(?:\s+(?P<second>[^>]+))?>)|(?P<url>(?i:https?)://\S+)|(?P<bare>@[A-Za-z0-9_][A-Za-z0-9_.-]*)",
    )
    .expect("valid message token regex")
});

/// Format `raw` into a [`FormattedMessage`].
///
/// `context` is the metadata of the feed the message came from; its follow
/// list resolves `@<nick>` and bare `@nick` mentions to feed URLs.
pub fn format_message(raw: &str, context: Option<&FeedMetadata>) -> FormattedMessage {
    let mut builder = SpanBuilder::default();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if !starts_token(raw, whole.start()) {
            continue;
        }

        builder.push_text(&raw[last..whole.start()]);
        last = whole.end();

        if caps.name("mention").is_some() {
            builder.push_span(bracket_mention(&caps, context));
        } else if caps.name("url").is_some() {
            let (url, trailing) = split_trailing(whole.as_str());
            if is_image_url(url) {
                builder.images.push(url.to_string());
            }
            builder.push_span(Span::link(url));
            builder.push_text(trailing);
        } else {
            let (handle, trailing) = split_trailing(whole.as_str());
            let nick = handle.trim_start_matches('@');
            match context.and_then(|meta| meta.follow_by_nick(nick)) {
                Some(follow) => {
                    builder.push_span(Span::Mention {
                        nick: nick.to_string(),
                        url: Some(follow.url.clone()),
                    });
                    builder.push_text(trailing);
                }
                None => builder.push_text(whole.as_str()),
            }
        }
    }

    builder.push_text(&raw[last..]);
    builder.finish()
}

/// Whether `url` points at a file with a known image extension.
pub fn is_image_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[derive(Default)]
struct SpanBuilder {
    spans: Vec<Span>,
    text: String,
    images: Vec<String>,
}

impl SpanBuilder {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_span(&mut self, span: Span) {
        self.flush();
        self.spans.push(span);
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.spans.push(Span::text(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> FormattedMessage {
        self.flush();
        if self.spans.is_empty() {
            self.spans.push(Span::text(""));
        }
        FormattedMessage {
            spans: self.spans,
            images: self.images,
        }
    }
}

fn bracket_mention(caps: &Captures<'_>, context: Option<&FeedMetadata>) -> Span {
    let first = caps.name("first").map(|m| m.as_str().trim()).unwrap_or_default();
    let second = caps.name("second").map(|m| m.as_str().trim());

    match second {
        Some(url) => Span::Mention {
            nick: first.to_string(),
            url: Some(url.to_string()),
        },
        None if first.contains("://") => Span::Mention {
            nick: Url::parse(first)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| first.to_string()),
            url: Some(first.to_string()),
        },
        None => Span::Mention {
            nick: first.to_string(),
            url: context
                .and_then(|meta| meta.follow_by_nick(first))
                .map(|follow| follow.url.clone()),
        },
    }
}

/// Matches only count when they begin a whitespace-delimited word, allowing
/// an opening bracket or quote in front.
fn starts_token(text: &str, start: usize) -> bool {
    match text[..start].chars().next_back() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | '"' | '\''),
    }
}

/// Split sentence punctuation and unbalanced closing brackets off the end
/// of a detected token.
fn split_trailing(token: &str) -> (&str, &str) {
    let mut end = token.len();

    loop {
        let candidate = &token[..end];
        let Some(last) = candidate.chars().next_back() else {
            break;
        };

        let unbalanced = match last {
            ')' => candidate.matches(')').count() > candidate.matches('(').count(),
            ']' => candidate.matches(']').count() > candidate.matches('[').count(),
            _ => false,
        };

        if TRAILING_PUNCTUATION.contains(&last) || unbalanced {
            end -= last.len_utf8();
        } else {
            break;
        }
    }

    token.split_at(end)
}
