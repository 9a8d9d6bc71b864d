use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app::FetchError;
use crate::config::DEFAULT_WORKERS;
use crate::fetcher::{FeedSource, Fetcher};
use crate::parser::{FeedContext, FeedParser, ParsedFeed};

/// One feed to fetch and how to label its entries.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub source: FeedSource,
    pub context: FeedContext,
}

impl FeedRequest {
    pub fn new(source: FeedSource, context: FeedContext) -> Self {
        Self { source, context }
    }
}

/// Fetches and parses many feeds concurrently, bounded by a semaphore.
/// Each feed is parsed independently once its full payload has arrived.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    parser: FeedParser,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            parser: FeedParser::new(),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Results come back in request order, one per request.
    pub async fn fetch_all(
        &self,
        requests: Vec<FeedRequest>,
        cancel: &CancellationToken,
    ) -> Vec<(FeedRequest, Result<ParsedFeed, FetchError>)> {
        let mut pending = Vec::new();
        let mut handles = Vec::new();

        for request in requests {
            let fetcher = self.fetcher.clone();
            let parser = self.parser.clone();
            let semaphore = self.semaphore.clone();
            let cancel = cancel.child_token();
            let task_request = request.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Err(FetchError::Cancelled);
                };
                fetch_feed(fetcher.as_ref(), &parser, &task_request, &cancel).await
            }));
            pending.push(request);
        }

        pending
            .into_iter()
            .zip(join_all(handles).await)
            .map(|(request, joined)| {
                let result = joined.unwrap_or_else(|e| {
                    tracing::error!("Task join error for {}: {}", request.source, e);
                    if e.is_cancelled() {
                        Err(FetchError::Cancelled)
                    } else {
                        Err(FetchError::TaskFailed(e.to_string()))
                    }
                });
                (request, result)
            })
            .collect()
    }
}

/// Fetch one feed and parse it.
pub async fn fetch_feed(
    fetcher: &(dyn Fetcher + Send + Sync),
    parser: &FeedParser,
    request: &FeedRequest,
    cancel: &CancellationToken,
) -> Result<ParsedFeed, FetchError> {
    let body = fetcher.fetch(&request.source, cancel).await.map_err(|e| {
        tracing::warn!(source = %request.source, error = %e, "fetch failed");
        e
    })?;

    Ok(parser.parse(&body, &request.context))
}
