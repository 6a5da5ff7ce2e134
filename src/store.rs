use crate::types::{Article, Feed, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Persistence boundary for articles. The engine reads through this to
/// resolve cutoffs and fallback timestamps; the polling trigger writes
/// through it.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// The article with the maximum published timestamp for this feed.
    async fn most_recent(&self, feed_id: Uuid) -> Result<Option<Article>>;

    /// The earliest-published stored article with this link URL, if any.
    async fn article_by_url(&self, feed_id: Uuid, url: &str) -> Result<Option<Article>>;

    async fn save(&self, article: &Article) -> Result<()>;
}

/// Persistence boundary for feeds.
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn all_feeds(&self) -> Result<Vec<Feed>>;

    async fn feed_by_url(&self, url: &str) -> Result<Option<Feed>>;

    async fn save_feed(&self, feed: &Feed) -> Result<()>;

    async fn mark_malformed(&self, feed_id: Uuid) -> Result<()>;
}

/// PostgreSQL-backed store.
pub struct PgStore {
    db: Pool<Postgres>,
}

impl PgStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    /// Create the schema if it does not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id UUID PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                favicon_url TEXT NOT NULL DEFAULT '',
                is_malformed BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id UUID PRIMARY KEY,
                feed_id UUID NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
                source_id TEXT,
                published_at TIMESTAMPTZ NOT NULL,
                url TEXT NOT NULL,
                image_url TEXT,
                title TEXT NOT NULL,
                word_count INTEGER
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (feed_id, published_at)")
            .execute(&self.db)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_url ON articles (feed_id, url)")
            .execute(&self.db)
            .await?;

        info!("Database schema initialized");
        Ok(())
    }

    fn article_from_row(row: &sqlx::postgres::PgRow) -> Article {
        Article {
            id: row.get("id"),
            feed_id: row.get("feed_id"),
            source_id: row.get("source_id"),
            published_at: row.get::<DateTime<Utc>, _>("published_at"),
            url: row.get("url"),
            image_url: row.get("image_url"),
            title: row.get("title"),
            word_count: row.get::<Option<i32>, _>("word_count").map(|n| n as u32),
        }
    }

    fn feed_from_row(row: &sqlx::postgres::PgRow) -> Feed {
        Feed {
            id: row.get("id"),
            url: row.get("url"),
            title: row.get("title"),
            description: row.get("description"),
            favicon_url: row.get("favicon_url"),
            is_malformed: row.get("is_malformed"),
        }
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn most_recent(&self, feed_id: Uuid) -> Result<Option<Article>> {
        let row = sqlx::query(
            "SELECT * FROM articles WHERE feed_id = $1 ORDER BY published_at DESC LIMIT 1",
        )
        .bind(feed_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(Self::article_from_row))
    }

    async fn article_by_url(&self, feed_id: Uuid, url: &str) -> Result<Option<Article>> {
        let row = sqlx::query(
            "SELECT * FROM articles WHERE feed_id = $1 AND url = $2 ORDER BY published_at ASC LIMIT 1",
        )
        .bind(feed_id)
        .bind(url)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.as_ref().map(Self::article_from_row))
    }

    async fn save(&self, article: &Article) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO articles (id, feed_id, source_id, published_at, url, image_url, title, word_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(article.id)
        .bind(article.feed_id)
        .bind(&article.source_id)
        .bind(article.published_at)
        .bind(&article.url)
        .bind(&article.image_url)
        .bind(&article.title)
        .bind(article.word_count.map(|n| n as i32))
        .execute(&self.db)
        .await?;

        debug!("Saved article {} ({})", article.id, article.url);
        Ok(())
    }
}

#[async_trait]
impl FeedStore for PgStore {
    async fn all_feeds(&self) -> Result<Vec<Feed>> {
        let rows = sqlx::query("SELECT * FROM feeds ORDER BY title")
            .fetch_all(&self.db)
            .await?;

        Ok(rows.iter().map(Self::feed_from_row).collect())
    }

    async fn feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query("SELECT * FROM feeds WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.as_ref().map(Self::feed_from_row))
    }

    async fn save_feed(&self, feed: &Feed) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feeds (id, url, title, description, favicon_url, is_malformed)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (url) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                favicon_url = EXCLUDED.favicon_url,
                is_malformed = EXCLUDED.is_malformed
            "#,
        )
        .bind(feed.id)
        .bind(&feed.url)
        .bind(&feed.title)
        .bind(&feed.description)
        .bind(&feed.favicon_url)
        .bind(feed.is_malformed)
        .execute(&self.db)
        .await?;

        info!("Saved feed: {} ({})", feed.title, feed.url);
        Ok(())
    }

    async fn mark_malformed(&self, feed_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE feeds SET is_malformed = TRUE WHERE id = $1")
            .bind(feed_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// In-memory store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    feeds: Arc<RwLock<HashMap<Uuid, Feed>>>,
    articles: Arc<RwLock<Vec<Article>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn most_recent(&self, feed_id: Uuid) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles
            .iter()
            .filter(|a| a.feed_id == feed_id)
            .max_by_key(|a| a.published_at)
            .cloned())
    }

    async fn article_by_url(&self, feed_id: Uuid, url: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles
            .iter()
            .filter(|a| a.feed_id == feed_id && a.url == url)
            .min_by_key(|a| a.published_at)
            .cloned())
    }

    async fn save(&self, article: &Article) -> Result<()> {
        self.articles.write().await.push(article.clone());
        Ok(())
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn all_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = self.feeds.read().await;
        let mut all: Vec<Feed> = feeds.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    async fn feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let feeds = self.feeds.read().await;
        Ok(feeds.values().find(|f| f.url == url).cloned())
    }

    async fn save_feed(&self, feed: &Feed) -> Result<()> {
        self.feeds.write().await.insert(feed.id, feed.clone());
        Ok(())
    }

    async fn mark_malformed(&self, feed_id: Uuid) -> Result<()> {
        if let Some(feed) = self.feeds.write().await.get_mut(&feed_id) {
            feed.is_malformed = true;
        }
        Ok(())
    }
}
