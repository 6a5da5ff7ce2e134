use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default reading speed used when no per-user speed is known.
pub const AVERAGE_WPM: u32 = 250;

pub const FAVICON_API_BASE_URL: &str = "https://www.google.com/s2/favicons";
pub const QUOTE_API_BASE_URL: &str = "https://api.quotable.io";

/// A subscribable RSS/Atom source with its channel metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    pub favicon_url: String,
    pub is_malformed: bool,
}

impl Feed {
    /// Build a Feed from an already-fetched, already-parsed document.
    /// The caller performs the one-shot fetch; no parse state is cached
    /// on the entity.
    pub fn from_parsed(url: String, parsed: &ParsedFeed) -> Self {
        let favicon_url = crate::reading::favicon_url(parsed.link.as_deref().unwrap_or(&url))
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            url,
            title: parsed.title.clone(),
            description: parsed.description.clone().unwrap_or_default(),
            favicon_url,
            is_malformed: false,
        }
    }
}

/// One item from a parsed feed document, prior to becoming a stored Article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEntry {
    pub source_id: Option<String>,
    /// Secondary identifier for entries assembled outside the feed parser
    /// (imports, tests). The parser itself leaves this unset: feed-rs folds
    /// an RSS `<guid>` into the entry id, which lands in `source_id`.
    pub guid: Option<String>,
    pub url: String,
    pub title: String,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// The channel metadata and entry list from a single parse of a feed document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

/// A stored article. Created exclusively by the ingestion engine and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub source_id: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub image_url: Option<String>,
    pub title: String,
    pub word_count: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "rss-reader/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed not found: {url}")]
    FeedNotFound { url: String },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, ReaderError>;
