use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum TwtError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TwtError>;

/// Why a feed could not be retrieved. Fatal to that feed's refresh only.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("request timed out")]
    Timeout,

    #[error("fetch cancelled")]
    Cancelled,

    #[error("invalid feed source: {0}")]
    InvalidSource(String),

    #[error("fetch task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::NetworkUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::HttpStatus(404).to_string(), "HTTP status 404");
        assert_eq!(
            FetchError::NotFound(PathBuf::from("/tmp/twtxt.txt")).to_string(),
            "no such file: /tmp/twtxt.txt"
        );
    }

    #[test]
    fn test_fetch_error_wraps_into_twt_error() {
        let err: TwtError = FetchError::Timeout.into();
        assert_eq!(err.to_string(), "Fetch error: request timed out");
    }
}
