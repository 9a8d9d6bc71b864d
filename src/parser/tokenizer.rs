use once_cell::sync::Lazy;
use regex::Regex;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 text of a glyph that some producer decoded as Windows-1252 or
/// Latin-1 and re-encoded, paired with the glyph it should have been.
const MANGLED_GLYPHS: &[(&str, &str)] = &[
    ("\u{e2}\u{2020}\u{2019}", "\u{2192}"),
    ("\u{e2}\u{86}\u{92}", "\u{2192}"),
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}"),
    ("\u{e2}\u{80}\u{94}", "\u{2014}"),
];

/// `user (timestamp): message`. The user is a single word; a prose line
/// like `released v1 (2023-05-05): notes` is not a header.
static HISTORICAL_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<author>[^\s()]*?)\s*\((?P<timestamp>\d{4}-\d{2}-\d{2}[^()]*)\):\s?(?P<message>.*)$")
        .expect("valid historical header regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A `# key = value` line.
    Metadata,
    /// A post, possibly spanning several physical lines.
    Post,
    /// A line that is not valid UTF-8.
    Undecodable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based line where the record starts.
    pub line: usize,
    pub content: String,
}

impl Token {
    fn new(kind: TokenKind, line: usize, content: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            content: content.into(),
        }
    }
}

/// Split raw feed bytes into metadata and post records.
///
/// Blank lines are dropped. A line that is neither metadata nor a post
/// header continues the preceding post.
pub fn tokenize(raw: &[u8]) -> Vec<Token> {
    let raw = raw.strip_prefix(BOM).unwrap_or(raw);

    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;

    for (idx, bytes) in split_lines(raw).into_iter().enumerate() {
        let line_no = idx + 1;

        let line = match std::str::from_utf8(bytes) {
            Ok(line) => normalize_glyphs(line),
            Err(_) => {
                tokens.extend(current.take());
                tokens.push(Token::new(
                    TokenKind::Undecodable,
                    line_no,
                    String::from_utf8_lossy(bytes),
                ));
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        if split_metadata(&line).is_some() {
            tokens.extend(current.take());
            tokens.push(Token::new(TokenKind::Metadata, line_no, line.trim()));
            continue;
        }

        if line.trim_start().starts_with('#') {
            // Free-form comment: kept as its own record so nothing appends to it.
            tokens.extend(current.take());
            tokens.push(Token::new(TokenKind::Post, line_no, line));
            continue;
        }

        match current.as_mut() {
            Some(post) if !is_post_header(&line) => {
                post.content.push('\n');
                post.content.push_str(&line);
            }
            _ => {
                tokens.extend(current.take());
                current = Some(Token::new(TokenKind::Post, line_no, line));
            }
        }
    }

    tokens.extend(current);
    tokens
}

/// Split a `# key = value` line into its trimmed key and value.
pub fn split_metadata(line: &str) -> Option<(&str, &str)> {
    let stripped = line.trim().strip_prefix('#')?;
    let (key, value) = stripped.split_once('=')?;
    let key = key.trim();

    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    valid_key.then(|| (key, value.trim()))
}

/// Whether a physical line starts a new post in either supported shape.
pub fn is_post_header(line: &str) -> bool {
    if let Some((timestamp, _)) = line.split_once('\t') {
        let timestamp = timestamp.trim_start();
        if !timestamp.is_empty() && !timestamp.contains(char::is_whitespace) {
            return true;
        }
    }

    HISTORICAL_HEADER_RE.is_match(line)
}

pub(crate) fn historical_header_re() -> &'static Regex {
    &HISTORICAL_HEADER_RE
}

fn normalize_glyphs(line: &str) -> String {
    MANGLED_GLYPHS
        .iter()
        .fold(line.to_string(), |acc, (mangled, canonical)| {
            if acc.contains(mangled) {
                acc.replace(mangled, canonical)
            } else {
                acc
            }
        })
}

/// Split on `\n`, `\r\n` or a lone `\r`.
fn split_lines(raw: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < raw.len() {
        match raw[i] {
            b'\n' => {
                lines.push(&raw[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&raw[start..i]);
                if raw.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if start < raw.len() {
        lines.push(&raw[start..]);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_metadata_and_posts() {
        let feed = "# nick = alice\n# url = https://a.example/twtxt.txt\n\n2024-01-01T00:00:00Z\tHello\n";
        let tokens = tokenize(feed.as_bytes());

        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Metadata, TokenKind::Metadata, TokenKind::Post]
        );
        assert_eq!(tokens[0].content, "# nick = alice");
        assert_eq!(tokens[2].content, "2024-01-01T00:00:00Z\tHello");
        assert_eq!(tokens[2].line, 4);
    }

    #[test]
    fn test_continuation_lines_join() {
        let feed = "2024-01-01T00:00:00Z\tfirst line\nsecond line\n2024-01-02T00:00:00Z\tnext\n";
        let tokens = tokenize(feed.as_bytes());

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].content, "2024-01-01T00:00:00Z\tfirst line\nsecond line");
        assert_eq!(tokens[1].content, "2024-01-02T00:00:00Z\tnext");
    }

    #[test]
    fn test_metadata_ends_continuation() {
        let feed = "2024-01-01T00:00:00Z\tpost\n# refresh = 60\ntrailing text\n";
        let tokens = tokenize(feed.as_bytes());

        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Post, TokenKind::Metadata, TokenKind::Post]
        );
        assert_eq!(tokens[0].content, "2024-01-01T00:00:00Z\tpost");
        assert_eq!(tokens[2].content, "trailing text");
    }

    #[test]
    fn test_plain_comment_is_standalone_post() {
        let feed = "# just a banner\nnot a header\n";
        let tokens = tokenize(feed.as_bytes());

        assert_eq!(kinds(&tokens), vec![TokenKind::Post, TokenKind::Post]);
        assert_eq!(tokens[0].content, "# just a banner");
        assert_eq!(tokens[1].content, "not a header");
    }

    #[test]
    fn test_crlf_and_bom() {
        let feed = b"\xEF\xBB\xBF# nick = bob\r\n2024-01-01T00:00:00Z\thi\r\n";
        let tokens = tokenize(feed);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].content, "# nick = bob");
        assert_eq!(tokens[1].content, "2024-01-01T00:00:00Z\thi");
    }

    #[test]
    fn test_lone_carriage_returns() {
        let tokens = tokenize(b"2024-01-01T00:00:00Z\ta\r2024-01-02T00:00:00Z\tb");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_invalid_utf8_line_isolated() {
        let mut feed = b"2024-01-01T00:00:00Z\tok\n".to_vec();
        feed.extend_from_slice(b"2024-01-02T00:00:00Z\tbad \xFF\xFE\n");
        feed.extend_from_slice(b"2024-01-03T00:00:00Z\talso ok\n");
        let tokens = tokenize(&feed);

        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Post, TokenKind::Undecodable, TokenKind::Post]
        );
        assert_eq!(tokens[2].content, "2024-01-03T00:00:00Z\talso ok");
    }

    #[test]
    fn test_mangled_arrow_normalized() {
        let feed = "2024-01-01T00:00:00Z\tA \u{e2}\u{2020}\u{2019} B\n";
        let tokens = tokenize(feed.as_bytes());
        assert_eq!(tokens[0].content, "2024-01-01T00:00:00Z\tA \u{2192} B");
    }

    #[test]
    fn test_historical_header() {
        assert!(is_post_header("alice (2024-01-01T00:00:00Z): hello"));
        assert!(is_post_header("2024-01-01T00:00:00Z\thello"));
        assert!(!is_post_header("just some words (aside): more"));
        assert!(!is_post_header("two words\tafter tab"));
        assert!(!is_post_header("released v1 (2023-05-05): notes"));
    }

    #[test]
    fn test_split_metadata() {
        assert_eq!(split_metadata("# nick = alice"), Some(("nick", "alice")));
        assert_eq!(
            split_metadata("#follow=jane https://j.example/twtxt.txt"),
            Some(("follow", "jane https://j.example/twtxt.txt"))
        );
        assert_eq!(split_metadata("# a sentence with = sign"), None);
        assert_eq!(split_metadata("nick = alice"), None);
    }
}
