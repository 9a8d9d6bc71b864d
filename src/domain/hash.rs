//! Twt hashes (Hash Extension).
//!
//! A twt hash is the last seven characters of the lowercase, unpadded
//! base32 encoding of the BLAKE2b-256 digest of
//! `"{feed_url}\n{timestamp}\n{text}"`.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chrono::{DateTime, SecondsFormat, Utc};
use data_encoding::BASE32_NOPAD;

type Blake2b256 = Blake2b<U32>;

pub const HASH_LEN: usize = 7;

/// Length of the longer hashes some clients write.
pub const LONG_HASH_LEN: usize = 12;

pub fn compute_twt_hash(feed_url: &str, timestamp: &str, text: &str) -> String {
    let payload = format!("{}\n{}\n{}", feed_url, normalize_timestamp(timestamp), text);
    let digest = Blake2b256::digest(payload.as_bytes());
    let encoded = BASE32_NOPAD.encode(&digest).to_ascii_lowercase();

    encoded[encoded.len() - HASH_LEN..].to_string()
}

/// RFC 3339 in UTC with seconds precision and a `Z` suffix. Timestamps
/// that don't parse are hashed verbatim.
pub fn normalize_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp.trim()) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => timestamp.to_string(),
    }
}

/// Whether `token` looks like a twt hash: lowercase base32, exactly
/// [`HASH_LEN`] or [`LONG_HASH_LEN`] characters.
pub fn is_hash_token(token: &str) -> bool {
    matches!(token.len(), HASH_LEN | LONG_HASH_LEN)
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || ('2'..='7').contains(&c))
}
