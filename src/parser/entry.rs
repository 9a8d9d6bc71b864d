use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::hash::is_hash_token;
use crate::domain::{EmptyResultNotice, TimelineEntry};
use crate::parser::tokenizer::{historical_header_re, Token, TokenKind};

static TIMESTAMP_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid timestamp shape regex"));

/// `(#hash)` or the addressed form `(#<hash url>)`.
static SUBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(#(?:<(?P<addressed>[^>\s]+)(?:\s+[^>]*)?>|(?P<subject>[^)\s]+))\)\s*")
        .expect("valid subject regex")
});

static HASH_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[#(?P<hash>[a-z2-7]+)\]\s*$").expect("valid hash tag regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidUtf8,
    Comment,
    MissingTimestamp,
    MalformedTimestamp,
    EmptyMessage,
    Unrecognized,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::InvalidUtf8 => "not valid UTF-8",
            SkipReason::Comment => "comment",
            SkipReason::MissingTimestamp => "missing timestamp",
            SkipReason::MalformedTimestamp => "malformed timestamp",
            SkipReason::EmptyMessage => "empty message",
            SkipReason::Unrecognized => "unrecognized line",
        };
        f.write_str(reason)
    }
}

/// A record that was skipped. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineParseWarning {
    pub line: usize,
    pub reason: SkipReason,
    pub content: String,
}

impl fmt::Display for LineParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Parsed(TimelineEntry),
    Skipped(LineParseWarning),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntries {
    pub entries: Vec<TimelineEntry>,
    pub warnings: Vec<LineParseWarning>,
    pub empty_notice: Option<EmptyResultNotice>,
}

/// Turn post tokens into entries, in source order.
///
/// `author` labels every entry except historical `user (timestamp): msg`
/// lines, which carry their own. When nothing parses, the result holds a
/// single placeholder entry and an [`EmptyResultNotice`].
pub fn parse_entries(tokens: &[Token], author: &str) -> ParsedEntries {
    let mut parsed = ParsedEntries::default();

    for token in tokens.iter().filter(|t| t.kind != TokenKind::Metadata) {
        match parse_record(token, author) {
            LineOutcome::Parsed(entry) => parsed.entries.push(entry),
            LineOutcome::Skipped(warning) => parsed.warnings.push(warning),
        }
    }

    if parsed.entries.is_empty() {
        parsed.entries.push(TimelineEntry::placeholder(author));
        parsed.empty_notice = Some(EmptyResultNotice {
            skipped_lines: parsed.warnings.len(),
        });
    }

    parsed
}

pub fn parse_record(token: &Token, author: &str) -> LineOutcome {
    let skip = |reason| {
        LineOutcome::Skipped(LineParseWarning {
            line: token.line,
            reason,
            content: token.content.clone(),
        })
    };

    if token.kind == TokenKind::Undecodable {
        return skip(SkipReason::InvalidUtf8);
    }

    let content = token.content.as_str();
    if content.trim_start().starts_with('#') {
        return skip(SkipReason::Comment);
    }

    let (label, timestamp, message) = match split_post(content) {
        Some(parts) => parts,
        None => return skip(SkipReason::Unrecognized),
    };

    if timestamp.is_empty() {
        return skip(SkipReason::MissingTimestamp);
    }
    if !TIMESTAMP_SHAPE_RE.is_match(timestamp) {
        return skip(SkipReason::MalformedTimestamp);
    }

    if message.trim().is_empty() {
        return skip(SkipReason::EmptyMessage);
    }

    let (reply_subject, body) = split_subject(message.trim_end());
    let (hash, body) = split_hash_tag(body);

    let mut entry =
        TimelineEntry::new(label.unwrap_or(author), timestamp, body).with_source_text(message);
    entry.reply_subject = reply_subject;
    entry.hash = hash;
    entry.line = token.line;

    LineOutcome::Parsed(entry)
}

/// Split a post record into `(author label, timestamp, message)`.
fn split_post(content: &str) -> Option<(Option<&str>, &str, &str)> {
    let header = content.lines().next().unwrap_or_default();

    if let Some((timestamp, message)) = content.split_once('\t') {
        let timestamp = timestamp.trim();
        if !timestamp.contains(char::is_whitespace) && header.contains('\t') {
            return Some((None, timestamp, message));
        }
    }

    let caps = historical_header_re().captures(content)?;
    let author = caps
        .name("author")
        .map(|m| m.as_str().trim())
        .filter(|a| !a.is_empty());
    let timestamp = caps.name("timestamp").map(|m| m.as_str().trim())?;
    let message = caps.name("message").map(|m| m.as_str()).unwrap_or_default();

    Some((author, timestamp, message))
}

fn split_subject(message: &str) -> (Option<String>, &str) {
    match SUBJECT_RE.captures(message) {
        Some(caps) => {
            let subject = caps
                .name("addressed")
                .or_else(|| caps.name("subject"))
                .map(|m| m.as_str().to_string());
            let rest = caps.get(0).map(|m| &message[m.end()..]).unwrap_or(message);
            (subject, rest)
        }
        None => (None, message),
    }
}

/// A trailing `[#hash]` tag. Only tokens of a real hash length count, so
/// `[#rustlang]` and similar stay part of the message.
fn split_hash_tag(message: &str) -> (Option<String>, &str) {
    if let Some(caps) = HASH_TAG_RE.captures(message) {
        if let (Some(whole), Some(hash)) = (caps.get(0), caps.name("hash")) {
            if is_hash_token(hash.as_str()) {
                return (Some(hash.as_str().to_string()), &message[..whole.start()]);
            }
        }
    }
    (None, message)
}
