use crate::types::{FetchConfig, ReaderError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

/// Document transport for the reader: feed documents and raw pages.
/// `Fetcher` is the HTTP implementation; the trait lets the orchestration
/// layer run against canned documents.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch a feed document by URL.
    async fn fetch_feed(&self, url: &str) -> Result<String>;

    /// Fetch an arbitrary page (article scraping, feed discovery).
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Blocking-free HTTP front door for feed documents and article pages.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url.host_str().unwrap_or("").to_string();

        let min_interval = Duration::from_secs(1); // Minimum 1 second between requests to same host

        // Compute the wait under the lock, sleep outside it: a delay for one
        // host must not stall fetches to every other host.
        let wait_time = {
            let rate_limiter = self.rate_limiter.read().await;
            rate_limiter.get(&host).and_then(|last_request| {
                let elapsed = Instant::now().duration_since(*last_request);
                (elapsed < min_interval).then(|| min_interval - elapsed)
            })
        };

        if let Some(wait_time) = wait_time {
            debug!("Rate limiting {}: waiting {:?}", host, wait_time);
            tokio::time::sleep(wait_time).await;
        }

        self.rate_limiter.write().await.insert(host, Instant::now());
        Ok(())
    }
}

#[async_trait]
impl FeedFetcher for Fetcher {
    /// Fetch a feed document, retrying transient failures with exponential
    /// backoff. Returns the response body.
    async fn fetch_feed(&self, url: &str) -> Result<String> {
        debug!("Fetching feed: {}", url);

        self.apply_rate_limit(url).await?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if !status.is_success() {
                        last_error = Some(ReaderError::General(format!(
                            "HTTP {}: {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown")
                        )));

                        if attempt < self.config.max_retries {
                            if let Some(delay) = backoff.next_backoff() {
                                warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                                tokio::time::sleep(delay).await;
                                continue;
                            }
                        }
                        break;
                    }

                    if let Some(content_length) = response.content_length() {
                        let size_mb = content_length as usize / (1024 * 1024);
                        if size_mb > self.config.max_feed_size_mb {
                            return Err(ReaderError::FeedTooLarge { size_mb });
                        }
                    }

                    match response.text().await {
                        Ok(content) => {
                            info!("Successfully fetched feed: {} ({} bytes)", url, content.len());
                            return Ok(content);
                        }
                        Err(e) => {
                            last_error = Some(ReaderError::Http(e));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(ReaderError::Http(e));

                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        error!("Failed to fetch feed after {} attempts: {}", self.config.max_retries + 1, url);
        Err(last_error.unwrap_or_else(|| ReaderError::General("Unknown fetch error".to_string())))
    }

    /// Fetch an arbitrary page (article scraping, feed discovery). Single
    /// attempt: failures here are tolerated by the callers.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching page: {}", url);

        self.apply_rate_limit(url).await?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ReaderError::General(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content = response.text().await?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limit_delay_for_one_host_does_not_block_others() {
        let fetcher = Arc::new(Fetcher::new(FetchConfig::default()));

        // Host A was hit just now, so its next request must wait.
        fetcher
            .rate_limiter
            .write()
            .await
            .insert("a.example.com".to_string(), Instant::now());

        let limited = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                fetcher.apply_rate_limit("http://a.example.com/feed").await
            })
        };

        // Give the limited task time to enter its sleep.
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Host B has never been hit; its request must go through while host
        // A is still waiting out its interval.
        let unrelated = tokio::time::timeout(
            Duration::from_millis(200),
            fetcher.apply_rate_limit("http://b.example.com/feed"),
        )
        .await;
        assert!(unrelated.is_ok());

        limited.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn first_request_to_a_host_is_not_delayed() {
        let fetcher = Fetcher::new(FetchConfig::default());

        let result = tokio::time::timeout(
            Duration::from_millis(200),
            fetcher.apply_rate_limit("http://fresh.example.com/feed"),
        )
        .await;
        assert!(result.is_ok());

        // The request is recorded for the next caller.
        assert!(fetcher
            .rate_limiter
            .read()
            .await
            .contains_key("fresh.example.com"));
    }
}
