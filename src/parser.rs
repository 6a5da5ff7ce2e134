use crate::types::{ParsedEntry, ParsedFeed, ReaderError, Result};
use feed_rs::parser;
use tracing::{debug, info};

/// Parses RSS/Atom documents into the transient `ParsedFeed` shape consumed
/// by the ingestion engine.
pub struct FeedParser;

impl FeedParser {
    /// Parse a raw feed document. A document the parser rejects, or one with
    /// no channel title, is malformed: the caller flags the feed and ingests
    /// nothing from this poll.
    pub fn parse_document(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| ReaderError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed
            .title
            .map(|t| t.content)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ReaderError::Parse("Feed document has no channel title".to_string()))?;

        let description = feed.description.map(|d| d.content);
        let link = feed.links.first().map(|l| l.href.clone());

        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .filter_map(Self::parse_entry)
            .collect();

        info!("Parsed feed \"{}\" with {} entries", title, entries.len());

        Ok(ParsedFeed {
            title,
            description,
            link,
            entries,
        })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
        // Entries without a link cannot become articles.
        let url = entry.links.first()?.href.clone();

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        // feed-rs folds an RSS <guid> into the entry id.
        let source_id = if entry.id.is_empty() {
            None
        } else {
            Some(entry.id)
        };

        let summary = entry.summary.map(|s| s.content);
        let published_at = entry.published;

        Some(ParsedEntry {
            source_id,
            guid: None,
            url,
            title,
            summary,
            published_at,
        })
    }
}
