use crate::fetcher::FeedFetcher;
use crate::types::{ReaderError, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// The full content extracted from an article's linked page.
#[derive(Debug, Clone, Default)]
pub struct ScrapedPage {
    pub top_image: Option<String>,
    pub text: String,
}

/// Fetches an article page and extracts its primary image and body text.
/// Failure here is never fatal: the ingestion engine degrades the article
/// instead of aborting the batch.
#[async_trait]
pub trait ArticleScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage>;
}

pub struct HttpScraper {
    fetcher: Arc<dyn FeedFetcher>,
}

impl HttpScraper {
    pub fn new(fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ArticleScraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let html = self
            .fetcher
            .fetch_page(url)
            .await
            .map_err(|e| ReaderError::Scrape(format!("Failed to fetch {}: {}", url, e)))?;

        let page = extract_page(&html, url);
        debug!(
            "Scraped {}: image={:?}, {} chars of text",
            url,
            page.top_image,
            page.text.len()
        );
        Ok(page)
    }
}

/// Pull the top image and readable text out of an HTML document.
pub fn extract_page(html: &str, base_url: &str) -> ScrapedPage {
    let document = Html::parse_document(html);

    ScrapedPage {
        top_image: extract_top_image(&document, base_url),
        text: extract_body_text(&document),
    }
}

fn extract_top_image(document: &Html, base_url: &str) -> Option<String> {
    let og_selector = Selector::parse(r#"meta[property="og:image"]"#).unwrap();
    let twitter_selector = Selector::parse(r#"meta[name="twitter:image"]"#).unwrap();
    let img_selector = Selector::parse("img[src]").unwrap();

    let raw = document
        .select(&og_selector)
        .filter_map(|el| el.value().attr("content"))
        .next()
        .or_else(|| {
            document
                .select(&twitter_selector)
                .filter_map(|el| el.value().attr("content"))
                .next()
        })
        .or_else(|| {
            document
                .select(&img_selector)
                .filter_map(|el| el.value().attr("src"))
                .next()
        })?;

    // Relative image paths are resolved against the article URL.
    match Url::parse(raw) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base_url)
            .ok()
            .and_then(|base| base.join(raw).ok())
            .map(|url| url.to_string()),
    }
}

fn extract_body_text(document: &Html) -> String {
    let article_p_selector = Selector::parse("article p").unwrap();
    let p_selector = Selector::parse("p").unwrap();

    let mut paragraphs: Vec<String> = document
        .select(&article_p_selector)
        .map(paragraph_text)
        .filter(|t| !t.is_empty())
        .collect();

    if paragraphs.is_empty() {
        paragraphs = document
            .select(&p_selector)
            .map(paragraph_text)
            .filter(|t| !t.is_empty())
            .collect();
    }

    paragraphs.join("\n\n")
}

fn paragraph_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
