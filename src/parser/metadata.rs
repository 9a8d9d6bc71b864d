use crate::domain::{FeedKind, FeedMetadata, Link};
use crate::parser::tokenizer::{split_metadata, Token, TokenKind};

/// Build [`FeedMetadata`] from every metadata token, wherever it sits in
/// the feed. Unknown keys are ignored.
pub fn extract(tokens: &[Token]) -> FeedMetadata {
    let mut metadata = FeedMetadata::default();

    for token in tokens.iter().filter(|t| t.kind == TokenKind::Metadata) {
        let Some((key, value)) = split_metadata(&token.content) else {
            continue;
        };
        apply(&mut metadata, &key.to_ascii_lowercase(), value);
    }

    metadata
}

fn apply(metadata: &mut FeedMetadata, key: &str, value: &str) {
    match key {
        "nick" => metadata.nick = non_empty(value),
        "description" => metadata.description = non_empty(value),
        "avatar" => metadata.avatar = non_empty(value),
        "url" => {
            if !value.is_empty() {
                metadata.urls.push(value.to_string());
                if metadata.url.is_none() {
                    metadata.url = Some(value.to_string());
                }
            }
        }
        "type" | "kind" => metadata.kind = FeedKind::from_value(value),
        "refresh" => {
            if let Ok(secs) = value.parse::<u64>() {
                metadata.refresh = Some(secs);
            }
        }
        "prev" => metadata.prev = non_empty(value),
        "follow" => metadata.follows.extend(Link::parse(value)),
        "following" => match value.parse::<u64>() {
            Ok(count) => metadata.following = Some(count),
            // Some clients write `following = nick url`.
            Err(_) => metadata
                .follows
                .extend(Link::parse(value).filter(|link| link.url.contains("://"))),
        },
        "link" => metadata.links.extend(Link::parse(value)),
        _ => tracing::trace!(key, "ignoring unknown metadata key"),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
