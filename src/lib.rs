pub mod types;
pub mod fetcher;
pub mod parser;
pub mod discovery;
pub mod scrape;
pub mod store;
pub mod ingest;
pub mod reading;
pub mod reader;

pub use types::*;
pub use fetcher::{FeedFetcher, Fetcher};
pub use parser::FeedParser;
pub use scrape::{ArticleScraper, HttpScraper, ScrapedPage};
pub use store::{ArticleStore, FeedStore, MemoryStore, PgStore};
pub use ingest::IngestionEngine;
pub use reader::FeedReader;
