use crate::discovery;
use crate::fetcher::{FeedFetcher, Fetcher};
use crate::ingest::IngestionEngine;
use crate::parser::FeedParser;
use crate::scrape::{ArticleScraper, HttpScraper};
use crate::store::{ArticleStore, FeedStore};
use crate::types::{Feed, FetchConfig, ParsedFeed, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Orchestrates the ingestion core: fetch, parse, filter, scrape, persist.
/// Feeds are polled sequentially; callers must not poll the same feed from
/// two workers, the store reads and writes are not fenced.
pub struct FeedReader {
    fetcher: Arc<dyn FeedFetcher>,
    engine: IngestionEngine,
    feeds: Arc<dyn FeedStore>,
    articles: Arc<dyn ArticleStore>,
}

impl FeedReader {
    pub fn new(
        config: FetchConfig,
        feeds: Arc<dyn FeedStore>,
        articles: Arc<dyn ArticleStore>,
    ) -> Self {
        let fetcher: Arc<dyn FeedFetcher> = Arc::new(Fetcher::new(config));
        let scraper: Arc<dyn ArticleScraper> = Arc::new(HttpScraper::new(fetcher.clone()));
        Self::with_scraper(fetcher, scraper, feeds, articles)
    }

    /// Assemble a reader around custom transport and scraper implementations.
    pub fn with_scraper(
        fetcher: Arc<dyn FeedFetcher>,
        scraper: Arc<dyn ArticleScraper>,
        feeds: Arc<dyn FeedStore>,
        articles: Arc<dyn ArticleStore>,
    ) -> Self {
        let engine = IngestionEngine::new(articles.clone(), scraper);
        Self {
            fetcher,
            engine,
            feeds,
            articles,
        }
    }

    /// Fetch and parse a feed URL into a Feed plus its current entry list.
    /// The URL scheme is normalized to http before the first fetch; redirects
    /// are free to upgrade it. A malformed document yields `None`.
    pub async fn feed_from_url(&self, url: &str) -> Result<Option<(Feed, ParsedFeed)>> {
        let url = discovery::set_url_scheme(url, "http")?;
        let body = self.fetcher.fetch_feed(&url).await?;

        match FeedParser::parse_document(&body) {
            Ok(parsed) => {
                let feed = Feed::from_parsed(url, &parsed);
                Ok(Some((feed, parsed)))
            }
            Err(e) => {
                warn!("Feed document at {} is malformed: {}", url, e);
                Ok(None)
            }
        }
    }

    /// Validate, persist, and initially ingest a feed. Returns `None` when
    /// the document is malformed. Adding a URL that is already stored
    /// returns the stored feed untouched.
    pub async fn add_feed(&self, url: &str) -> Result<Option<Feed>> {
        let (feed, parsed) = match self.feed_from_url(url).await? {
            Some(pair) => pair,
            None => return Ok(None),
        };

        if let Some(existing) = self.feeds.feed_by_url(&feed.url).await? {
            info!("Feed already stored: {}", feed.url);
            return Ok(Some(existing));
        }

        self.feeds.save_feed(&feed).await?;
        let ingested = self.ingest_entries(&feed, &parsed).await?;
        info!("Added feed {} with {} initial articles", feed.url, ingested);
        Ok(Some(feed))
    }

    /// Poll every stored feed once. A feed whose document fails to parse is
    /// flagged malformed and skipped; one feed's failure never aborts the
    /// rest. Returns the total number of articles ingested.
    pub async fn poll_all(&self) -> Result<usize> {
        let feeds = self.feeds.all_feeds().await?;
        let mut total = 0;

        info!("Polling {} feeds", feeds.len());
        for feed in feeds {
            match self.poll_feed(&feed).await {
                Ok(count) => total += count,
                Err(e) => {
                    error!("Failed to poll feed {}: {}", feed.url, e);
                }
            }
        }

        info!("Poll complete: {} new articles", total);
        Ok(total)
    }

    /// Poll a single feed: fetch, parse, ingest the new entries.
    pub async fn poll_feed(&self, feed: &Feed) -> Result<usize> {
        let body = self.fetcher.fetch_feed(&feed.url).await?;

        let parsed = match FeedParser::parse_document(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Feed {} is malformed: {}", feed.url, e);
                self.feeds.mark_malformed(feed.id).await?;
                return Ok(0);
            }
        };

        self.ingest_entries(feed, &parsed).await
    }

    async fn ingest_entries(&self, feed: &Feed, parsed: &ParsedFeed) -> Result<usize> {
        let most_recent = self.articles.most_recent(feed.id).await?;
        let new_entries = self
            .engine
            .pull_new(feed, &parsed.entries, most_recent.as_ref())
            .await?;

        let mut saved = 0;
        for entry in &new_entries {
            let article = self.engine.build_article(feed, entry).await?;
            self.articles.save(&article).await?;
            saved += 1;
        }

        Ok(saved)
    }

    /// Discover feeds on a website, validate each candidate, and persist the
    /// well-formed ones. Candidates that fail to fetch or parse are skipped.
    pub async fn discover_and_add(&self, website_url: &str) -> Result<Vec<Feed>> {
        let candidates = discovery::discover_feed_urls(self.fetcher.as_ref(), website_url).await?;
        let mut added = Vec::new();

        for candidate in candidates {
            match self.add_feed(&candidate).await {
                Ok(Some(feed)) => added.push(feed),
                Ok(None) => {
                    warn!("Discovered candidate {} is malformed; skipping", candidate);
                }
                Err(e) => {
                    warn!("Failed to add discovered feed {}: {}", candidate, e);
                }
            }
        }

        Ok(added)
    }
}
