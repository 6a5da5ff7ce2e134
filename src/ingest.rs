use crate::scrape::ArticleScraper;
use crate::store::ArticleStore;
use crate::types::{Article, Feed, ParsedEntry, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Converts a feed's freshly parsed entry list into the subset of new
/// articles to persist. Deduplication lives here, not in the caller.
pub struct IngestionEngine {
    store: Arc<dyn ArticleStore>,
    scraper: Arc<dyn ArticleScraper>,
}

impl IngestionEngine {
    pub fn new(store: Arc<dyn ArticleStore>, scraper: Arc<dyn ArticleScraper>) -> Self {
        Self { store, scraper }
    }

    /// Resolve the published timestamp for an entry.
    ///
    /// An explicit timestamp from the feed wins. Without one, a stored
    /// article with the same link supplies its timestamp, so a dateless
    /// entry seen on an earlier poll stays behind the cutoff. A dateless
    /// entry never seen before gets the current wall clock (first-seen
    /// semantics for feeds that omit dates).
    pub async fn resolve_published_date(
        &self,
        feed: &Feed,
        entry: &ParsedEntry,
    ) -> Result<DateTime<Utc>> {
        if let Some(published_at) = entry.published_at {
            return Ok(published_at);
        }

        if let Some(existing) = self.store.article_by_url(feed.id, &entry.url).await? {
            return Ok(existing.published_at);
        }

        Ok(Utc::now())
    }

    /// Filter the entry list down to those newer than the most recently
    /// stored article. With no stored article (first poll), every entry is
    /// new. Reads the store only to resolve missing timestamps; no writes,
    /// no network.
    pub async fn pull_new(
        &self,
        feed: &Feed,
        entries: &[ParsedEntry],
        most_recent: Option<&Article>,
    ) -> Result<Vec<ParsedEntry>> {
        let cutoff = match most_recent {
            None => {
                debug!("Feed {} has no stored articles; all {} entries are new", feed.url, entries.len());
                return Ok(entries.to_vec());
            }
            Some(article) => article.published_at,
        };

        let mut new_entries = Vec::new();
        for entry in entries {
            let published_at = self.resolve_published_date(feed, entry).await?;
            if published_at > cutoff {
                new_entries.push(entry.clone());
            }
        }

        info!(
            "Feed {}: {} of {} entries newer than cutoff {}",
            feed.url,
            new_entries.len(),
            entries.len(),
            cutoff
        );
        Ok(new_entries)
    }

    /// Build a persistable article from an entry, enriched with scraped
    /// content where possible. Entry metadata is authoritative for title and
    /// link; the scrape contributes only the image and the word count. A
    /// failed scrape degrades the article, it never fails it.
    pub async fn build_article(&self, feed: &Feed, entry: &ParsedEntry) -> Result<Article> {
        let published_at = self.resolve_published_date(feed, entry).await?;

        let mut article = Article {
            id: Uuid::new_v4(),
            feed_id: feed.id,
            source_id: entry.source_id.clone().or_else(|| entry.guid.clone()),
            published_at,
            url: entry.url.clone(),
            image_url: None,
            title: entry.title.clone(),
            word_count: None,
        };

        match self.scraper.scrape(&entry.url).await {
            Ok(page) => {
                article.image_url = page.top_image;
                let word_count = page.text.split_whitespace().count();
                if word_count > 0 {
                    article.word_count = Some(word_count as u32);
                }
            }
            Err(e) => {
                warn!("Scrape failed for {}: {}", entry.url, e);
            }
        }

        Ok(article)
    }
}
