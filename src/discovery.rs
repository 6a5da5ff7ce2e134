use crate::fetcher::FeedFetcher;
use crate::parser::FeedParser;
use crate::types::{ReaderError, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

const FEED_MIME_TYPES: [&str; 4] = [
    "application/rss+xml",
    "application/atom+xml",
    "application/xml",
    "text/xml",
];

/// Normalize a possibly schemeless URL to the given scheme.
/// "example.com" becomes "http://example.com/"; an existing scheme is
/// replaced.
pub fn set_url_scheme(raw: &str, scheme: &str) -> Result<String> {
    let coerced = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{}://{}", scheme, raw)
    };
    let mut url = Url::parse(&coerced)?;
    url.set_scheme(scheme)
        .map_err(|_| ReaderError::General(format!("Cannot set scheme {} on {}", scheme, raw)))?;
    Ok(url.to_string())
}

/// Append the conventional /rss path, respecting an existing trailing slash.
pub fn with_rss_suffix(url: &str) -> String {
    if url.ends_with('/') {
        format!("{}rss", url)
    } else {
        format!("{}/rss", url)
    }
}

/// Find candidate feed URLs for a website. Tries the URL itself first; if
/// nothing turns up, retries with the /rss suffix. An empty result is not an
/// error.
pub async fn discover_feed_urls(fetcher: &dyn FeedFetcher, website_url: &str) -> Result<Vec<String>> {
    let website_url = set_url_scheme(website_url, "http")?;

    let mut candidates = scan_for_feeds(fetcher, &website_url).await?;
    if candidates.is_empty() {
        let fallback = with_rss_suffix(&website_url);
        debug!("No feeds at {}; trying {}", website_url, fallback);
        candidates = scan_for_feeds(fetcher, &fallback).await?;
    }

    info!("Discovered {} candidate feed(s) for {}", candidates.len(), website_url);
    Ok(candidates)
}

async fn scan_for_feeds(fetcher: &dyn FeedFetcher, url: &str) -> Result<Vec<String>> {
    let body = match fetcher.fetch_page(url).await {
        Ok(body) => body,
        Err(e) => {
            debug!("Discovery fetch failed for {}: {}", url, e);
            return Ok(Vec::new());
        }
    };

    // The URL may point straight at a feed document.
    if FeedParser::parse_document(&body).is_ok() {
        return Ok(vec![url.to_string()]);
    }

    Ok(extract_feed_candidates(&body, url))
}

/// Collect feed URLs referenced by an HTML page: `<link rel="alternate">`
/// elements with a feed MIME type, then anchors whose href looks feed-like.
pub fn extract_feed_candidates(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse(r#"link[rel="alternate"][href]"#).unwrap();
    let anchor_selector = Selector::parse("a[href]").unwrap();

    let base = Url::parse(base_url).ok();
    let resolve = |href: &str| -> Option<String> {
        match Url::parse(href) {
            Ok(url) => Some(url.to_string()),
            Err(_) => base.as_ref().and_then(|b| b.join(href).ok()).map(|u| u.to_string()),
        }
    };

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for el in document.select(&link_selector) {
        let is_feed_type = el
            .value()
            .attr("type")
            .map(|t| FEED_MIME_TYPES.contains(&t))
            .unwrap_or(false);
        if !is_feed_type {
            continue;
        }
        if let Some(href) = el.value().attr("href").and_then(|h| resolve(h)) {
            if seen.insert(href.clone()) {
                candidates.push(href);
            }
        }
    }

    for el in document.select(&anchor_selector) {
        let href = match el.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        if !looks_like_feed_url(href) {
            continue;
        }
        if let Some(resolved) = resolve(href) {
            if seen.insert(resolved.clone()) {
                candidates.push(resolved);
            }
        }
    }

    candidates
}

fn looks_like_feed_url(href: &str) -> bool {
    let lower = href.to_lowercase();
    lower.ends_with(".rss")
        || lower.ends_with(".xml")
        || lower.ends_with("/rss")
        || lower.ends_with("/feed")
        || lower.contains("/rss/")
        || lower.contains("/feeds/")
        || lower.contains("atom")
}
