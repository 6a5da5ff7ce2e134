use crate::types::{ReaderError, Result, FAVICON_API_BASE_URL, QUOTE_API_BASE_URL};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Minutes needed to read `word_count` words at `wpm` words per minute,
/// rounded up, never below one.
pub fn time_to_read(word_count: u32, wpm: u32) -> u32 {
    ((word_count as f64 / wpm as f64).ceil() as u32).max(1)
}

/// "4 min" style label; empty when the word count is unknown (scrape failed
/// or produced no text).
pub fn format_time_to_read(word_count: Option<u32>, wpm: u32) -> String {
    match word_count {
        None => String::new(),
        Some(words) => format!("{} min", time_to_read(words, wpm)),
    }
}

/// Compact article date label relative to `now`: today and yesterday get a
/// word, this year drops the year.
pub fn format_article_date(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let format_str = if now.date_naive() == published_at.date_naive() {
        "Today, %H:%M"
    } else if now.date_naive() - Duration::days(1) == published_at.date_naive() {
        "Yesterday, %H:%M"
    } else if now.year() == published_at.year() {
        "%b. %d, %H:%M"
    } else {
        "%b. %d, %Y, %H:%M"
    };
    published_at.format(format_str).to_string()
}

/// Favicon service URL for the domain of `page_url`.
pub fn favicon_url(page_url: &str) -> Result<String> {
    let parsed = Url::parse(page_url)?;
    let domain = parsed
        .host_str()
        .ok_or_else(|| ReaderError::General(format!("URL has no host: {}", page_url)))?;

    let mut api_url = Url::parse(FAVICON_API_BASE_URL)?;
    api_url.query_pairs_mut().append_pair("domain", domain);
    Ok(api_url.to_string())
}

/// A quote used by the reading-speed measurement flow: the user times
/// themselves reading it and their words-per-minute is derived from its
/// length.
#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    pub content: String,
    pub author: String,
    pub length: u32,
}

/// Fetch a random quote of at least `min_length` characters.
pub async fn fetch_quote(client: &reqwest::Client, min_length: u32) -> Result<Quote> {
    let url = format!("{}/quotes/random", QUOTE_API_BASE_URL);
    debug!("Fetching quote (min length {})", min_length);

    let quotes: Vec<Quote> = client
        .get(&url)
        .query(&[("minLength", min_length)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    quotes
        .into_iter()
        .next()
        .ok_or_else(|| ReaderError::General("Quote API returned no quotes".to_string()))
}
