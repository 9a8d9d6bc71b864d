use std::io::ErrorKind;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::app::FetchError;
use crate::fetcher::{cancellable, FeedSource, Fetcher};

/// Reads feeds from the local filesystem, e.g. the user's own twtxt.txt.
#[derive(Debug, Clone, Default)]
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, source: &FeedSource, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        let path = match source {
            FeedSource::Local(path) => path,
            FeedSource::Remote(url) => {
                return Err(FetchError::InvalidSource(format!("{} is not a local path", url)))
            }
        };

        tracing::debug!(path = %path.display(), "reading feed");

        cancellable(cancel, async {
            tokio::fs::read(path).await.map_err(|e| match e.kind() {
                ErrorKind::NotFound => FetchError::NotFound(path.clone()),
                _ => FetchError::Io(e),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twtxt.txt");
        std::fs::write(&path, "2024-01-01T00:00:00Z\thello\n").unwrap();

        let body = LocalFetcher::new()
            .fetch(&FeedSource::Local(path), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body, b"2024-01-01T00:00:00Z\thello\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let result = LocalFetcher::new()
            .fetch(&FeedSource::Local(path.clone()), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(FetchError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_rejects_remote_source() {
        let source = FeedSource::parse("https://example.com/twtxt.txt").unwrap();
        let result = tokio_test::block_on(LocalFetcher::new().fetch(&source, &CancellationToken::new()));
        assert!(matches!(result, Err(FetchError::InvalidSource(_))));
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = LocalFetcher::new()
            .fetch(&FeedSource::Local(PathBuf::from("/does/not/matter")), &cancel)
            .await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
