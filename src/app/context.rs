use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::app::error::{FetchError, Result};
use crate::config::{Config, Subscription};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::{fetch_feed, FeedRequest, ParallelFetcher};
use crate::fetcher::{FeedSource, Fetcher, SourceFetcher};
use crate::parser::{FeedContext, FeedParser, ParsedFeed};

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub parallel_fetcher: ParallelFetcher,
    pub parser: FeedParser,
    /// Cancels every in-flight fetch started through this context.
    pub cancel: CancellationToken,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpFetcher::new(&config.fetch)?;
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(SourceFetcher::new(http));
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher.clone(), config.fetch.workers);

        Self {
            config,
            fetcher,
            parallel_fetcher,
            parser: FeedParser::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Fetch and parse a single feed.
    pub async fn load_feed(&self, request: &FeedRequest) -> std::result::Result<ParsedFeed, FetchError> {
        fetch_feed(self.fetcher.as_ref(), &self.parser, request, &self.cancel).await
    }

    /// The user's own feed, if a local path is configured.
    pub fn own_feed_request(&self) -> Option<FeedRequest> {
        let twtxt = &self.config.twtxt;
        let path = twtxt.path.clone()?;

        let mut context = FeedContext::new();
        if let Some(url) = &twtxt.url {
            context = context.with_url(url.clone());
        }
        if let Some(nick) = &twtxt.nick {
            context = context.with_label(nick.clone());
        }

        Some(FeedRequest::new(FeedSource::Local(path), context))
    }

    /// Requests for every followed feed. Entries with unusable URLs are
    /// logged and left out.
    pub fn following_requests(&self) -> Vec<FeedRequest> {
        self.config
            .following
            .iter()
            .filter_map(|sub| match self.subscription_request(sub) {
                Ok(request) => Some(request),
                Err(e) => {
                    tracing::warn!(label = %sub.label, url = %sub.url, error = %e, "skipping subscription");
                    None
                }
            })
            .collect()
    }

    fn subscription_request(&self, sub: &Subscription) -> std::result::Result<FeedRequest, FetchError> {
        let source = FeedSource::parse(&sub.url)?;
        let context = FeedContext::new()
            .with_url(sub.url.clone())
            .with_label(sub.label.clone())
            .prefer_label(self.config.display.use_labels);
        Ok(FeedRequest::new(source, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_own_feed_request() {
        let mut config = Config::default();
        config.twtxt.path = Some(PathBuf::from("/srv/twtxt.txt"));
        config.twtxt.url = Some("https://me.example/twtxt.txt".into());
        config.twtxt.nick = Some("me".into());

        let ctx = AppContext::new(config).unwrap();
        let request = ctx.own_feed_request().unwrap();

        assert_eq!(request.source, FeedSource::Local(PathBuf::from("/srv/twtxt.txt")));
        assert_eq!(request.context.url.as_deref(), Some("https://me.example/twtxt.txt"));
        assert_eq!(request.context.label.as_deref(), Some("me"));
    }

    #[test]
    fn test_no_own_feed_without_path() {
        let ctx = AppContext::new(Config::default()).unwrap();
        assert!(ctx.own_feed_request().is_none());
    }

    #[test]
    fn test_following_requests_skip_invalid() {
        let mut config = Config::default();
        config.display.use_labels = true;
        config.following = vec![
            Subscription::new("jane", "https://jane.example/twtxt.txt"),
            Subscription::new("broken", "ftp://nowhere/twtxt.txt"),
        ];

        let ctx = AppContext::new(config).unwrap();
        let requests = ctx.following_requests();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].context.label.as_deref(), Some("jane"));
        assert!(requests[0].context.prefer_label);
    }
}
