pub mod http_fetcher;
pub mod local;
pub mod parallel;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::app::FetchError;

pub use http_fetcher::HttpFetcher;
pub use local::LocalFetcher;
pub use parallel::{FeedRequest, ParallelFetcher};

/// Where a feed's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Local(PathBuf),
    Remote(Url),
}

impl FeedSource {
    /// `http(s)://` and `file://` URLs, or a bare filesystem path.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let input = input.trim();
        let lower = input.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(input).map_err(|e| FetchError::InvalidSource(format!("{}: {}", input, e)))?;
            return Ok(FeedSource::Remote(url));
        }

        if lower.starts_with("file://") {
            let path = Url::parse(input)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| FetchError::InvalidSource(input.to_string()))?;
            return Ok(FeedSource::Local(path));
        }

        if input.is_empty() || input.contains("://") {
            return Err(FetchError::InvalidSource(input.to_string()));
        }

        Ok(FeedSource::Local(PathBuf::from(input)))
    }

    /// The URL to identify this feed by, if it has one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FeedSource::Remote(url) => Some(url.as_str()),
            FeedSource::Local(_) => None,
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Local(path) => write!(f, "{}", path.display()),
            FeedSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Retrieves the raw bytes of a feed. The full payload is returned or
/// nothing is; cancellation never yields partial content.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, source: &FeedSource, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError>;
}

/// Dispatches to [`HttpFetcher`] or [`LocalFetcher`] by source kind.
pub struct SourceFetcher {
    http: HttpFetcher,
    local: LocalFetcher,
}

impl SourceFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            local: LocalFetcher::new(),
        }
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, source: &FeedSource, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        match source {
            FeedSource::Remote(_) => self.http.fetch(source, cancel).await,
            FeedSource::Local(_) => self.local.fetch(source, cancel).await,
        }
    }
}

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let source = FeedSource::parse("https://example.com/twtxt.txt").unwrap();
        assert_eq!(source.url(), Some("https://example.com/twtxt.txt"));
    }

    #[test]
    fn test_parse_local_path() {
        let source = FeedSource::parse("/home/me/twtxt.txt").unwrap();
        assert_eq!(source, FeedSource::Local(PathBuf::from("/home/me/twtxt.txt")));
        assert_eq!(source.url(), None);
    }

    #[test]
    fn test_parse_file_url() {
        let source = FeedSource::parse("file:///tmp/twtxt.txt").unwrap();
        assert_eq!(source, FeedSource::Local(PathBuf::from("/tmp/twtxt.txt")));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(matches!(
            FeedSource::parse("gopher://example.com/twtxt.txt"),
            Err(FetchError::InvalidSource(_))
        ));
        assert!(matches!(FeedSource::parse(""), Err(FetchError::InvalidSource(_))));
        assert!(matches!(
            FeedSource::parse("https://"),
            Err(FetchError::InvalidSource(_))
        ));
    }

    #[tokio::test]
    async fn test_cancellable_reports_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, async { Ok::<_, FetchError>(1) }).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_interrupts_pending_future() {
        let cancel = CancellationToken::new();
        let started = std::sync::Arc::new(tokio::sync::Notify::new());

        let trigger = {
            let cancel = cancel.clone();
            let started = started.clone();
            tokio::spawn(async move {
                started.notified().await;
                cancel.cancel();
            })
        };

        let result = cancellable(&cancel, async {
            started.notify_one();
            std::future::pending::<Result<Vec<u8>, FetchError>>().await
        })
        .await;

        trigger.await.unwrap();
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_passes_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, FetchError>(1) }).await;
        assert_eq!(result.unwrap(), 1);
    }
}
