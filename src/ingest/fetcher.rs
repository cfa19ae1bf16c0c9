use std::sync::Arc;
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::domain::ArticleRecord;
use crate::errors::{NewsflowError, NewsflowResult};
use crate::ingest::extractor::{ContentExtractor, PageExtractor};
use crate::ingest::parser::{self, RawArticle};
use crate::ingest::USER_AGENT;
use crate::storage::ArticleStore;

const FEED_TIMEOUT: Duration = Duration::from_secs(15);
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches feeds and runs their items through the ingestion pipeline:
/// dedup gate, content sufficiency, full-page extraction, then the store.
#[derive(Clone)]
pub struct FeedFetcher {
    client: Client,
    extractor: Arc<dyn ContentExtractor>,
    store: Arc<dyn ArticleStore>,
}

impl FeedFetcher {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self::with_extractor(store, Arc::new(PageExtractor::new()))
    }

    pub fn with_extractor(
        store: Arc<dyn ArticleStore>,
        extractor: Arc<dyn ContentExtractor>,
    ) -> Self {
        let client = Client::builder()
            .timeout(FEED_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            extractor,
            store,
        }
    }

    /// Fetch one feed and ingest its items. Any failure is logged and
    /// leaves the store as it was. Returns the number of newly stored
    /// articles.
    pub fn fetch(&self, feed_url: &str, source_name: &str) -> usize {
        let response = match self.client.get(feed_url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %feed_url, error = %e, "Failed to fetch feed");
                return 0;
            }
        };
        if response.status() != StatusCode::OK {
            warn!(url = %feed_url, status = %response.status(), "Feed request rejected");
            return 0;
        }
        let body = match response.text() {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %feed_url, error = %e, "Feed body unreadable");
                return 0;
            }
        };

        match self.ingest_feed(&body, source_name) {
            Ok(saved) => {
                if saved > 0 {
                    info!(source = source_name, saved, "Stored new articles");
                }
                saved
            }
            Err(e) => {
                warn!(url = %feed_url, error = %e, "Failed to parse feed");
                0
            }
        }
    }

    /// Parse a feed body and store every item not seen before. Per-item
    /// problems skip that item only.
    pub fn ingest_feed(&self, body: &str, source_name: &str) -> NewsflowResult<usize> {
        let articles = parser::parse_feed(body)?.into_articles();
        let mut saved = 0;
        for article in articles {
            match self.ingest_article(article, source_name) {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => warn!(source = source_name, error = %e, "Skipping article"),
            }
        }
        Ok(saved)
    }

    fn ingest_article(&self, article: RawArticle, source_name: &str) -> NewsflowResult<bool> {
        let Some(link) = article.link else {
            debug!(source = source_name, "Item without link, skipping");
            return Ok(false);
        };
        if self.store.exists_by_url(&link)? {
            debug!(link = %link, "Already stored, skipping");
            return Ok(false);
        }

        let mut content = article.body;
        if self
            .extractor
            .needs_full_content(content.as_deref().unwrap_or_default())
        {
            if let Some(full) = self.extractor.fetch_full_content(&link) {
                content = Some(full);
            }
        }

        // Image and fallback summary come from whatever content we ended
        // up with, not from what the feed originally carried.
        let content = content.unwrap_or_default();
        let image_url = parser::extract_image(&content);
        let summary = match article.summary {
            Some(summary) => summary,
            None => parser::strip_to_summary(&content),
        };

        let record = ArticleRecord {
            title: article.title.unwrap_or_default(),
            link,
            source: source_name.to_string(),
            published_date: parser::normalize_date(article.raw_date.as_deref()),
            summary,
            content,
            image_url,
        };
        self.store.save_if_new(record)
    }

    /// Check that a URL serves a parseable feed. Yields the feed's title
    /// (or a per-format default) when it does, absence otherwise.
    pub fn validate_feed(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).timeout(VALIDATE_TIMEOUT).send() {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Validation request failed");
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            debug!(url = %url, status = %response.status(), "Validation rejected");
            return None;
        }
        let body = response.text().ok()?;
        classify_feed(&body)
    }
}

/// Structural format detection: a `<channel>` container means RSS, a
/// `<feed>` container (any prefix) means Atom. The title is the first
/// direct-child `<title>` of that container, defaulting to "RSS Feed" or
/// "Atom Feed" when the container has none. Anything else, including
/// malformed XML, is absence.
pub fn classify_feed(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if start.name().as_ref() == b"channel" {
                    return match direct_child_title(&mut reader, false) {
                        Ok(Some(title)) => Some(title),
                        Ok(None) => Some("RSS Feed".to_string()),
                        Err(_) => None,
                    };
                }
                if start.local_name().as_ref() == b"feed" {
                    return match direct_child_title(&mut reader, true) {
                        Ok(Some(title)) => Some(title),
                        Ok(None) => Some("Atom Feed".to_string()),
                        Err(_) => None,
                    };
                }
            }
            Ok(Event::Eof) => return None,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

/// Scan the direct children of the container just opened for its first
/// `<title>`; nested titles (say, inside an RSS `<image>`) do not count.
fn direct_child_title(
    reader: &mut Reader<&[u8]>,
    match_local_name: bool,
) -> NewsflowResult<Option<String>> {
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let is_title = if match_local_name {
                    start.local_name().as_ref() == b"title"
                } else {
                    start.name().as_ref() == b"title"
                };
                if depth == 0 && is_title {
                    return Ok(Some(parser::read_element_text(reader)?));
                }
                depth += 1;
            }
            Event::Empty(start) => {
                let is_title = if match_local_name {
                    start.local_name().as_ref() == b"title"
                } else {
                    start.name().as_ref() == b"title"
                };
                if depth == 0 && is_title {
                    return Ok(Some(String::new()));
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(None);
                }
                depth -= 1;
            }
            Event::Eof => {
                return Err(NewsflowError::FeedParse(
                    "unexpected end of document inside feed container".to_string(),
                ))
            }
            _ => {}
        }
    }
}
