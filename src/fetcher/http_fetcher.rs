use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::app::FetchError;
use crate::config::FetchConfig;
use crate::fetcher::{cancellable, FeedSource, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(%url, "fetching feed");

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?.to_vec();
        tracing::debug!(%url, bytes = body.len(), "fetched feed");

        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &FeedSource, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        match source {
            FeedSource::Remote(url) => cancellable(cancel, self.get(url)).await,
            FeedSource::Local(path) => Err(FetchError::InvalidSource(format!(
                "{} is not an http(s) URL",
                path.display()
            ))),
        }
    }
}
