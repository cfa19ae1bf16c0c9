use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::ingest::sanitizer;
use crate::ingest::USER_AGENT;

/// Feed-provided content shorter than this (as plain text) triggers a
/// full-page fetch.
pub const MIN_CONTENT_LENGTH: usize = 200;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Boilerplate stripped from pages before any extraction strategy runs.
static NOISE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "script, style, nav, footer, header, aside, .ad, .ads, .advertisement, \
         .social-share, .comments, .related, .sidebar, .menu, .navigation, .cookie, \
         .popup, #comments, #sidebar, #footer, #header, #nav",
    )
    .expect("valid selector")
});

static ARTICLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("valid selector"));

static DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div").expect("valid selector"));

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid selector"));

/// Containers sites commonly put their article body in, most specific first.
static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[role=main]",
        "main",
        ".post-content",
        ".article-content",
        ".article-body",
        ".entry-content",
        ".story-body",
        ".content-body",
        ".post-body",
        "#article-body",
        ".article__content",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid selector"))
    .collect()
});

/// Decides whether feed content is good enough and fetches the article page
/// when it is not.
#[cfg_attr(test, mockall::automock)]
pub trait ContentExtractor: Send + Sync {
    /// True when `content` is blank or its plain text runs under the
    /// minimum length.
    fn needs_full_content(&self, content: &str) -> bool;

    /// Fetch the article page and pull out its main content. Absence means
    /// the caller keeps whatever the feed provided.
    fn fetch_full_content(&self, article_url: &str) -> Option<String>;
}

/// HTTP-backed extractor used outside of tests.
pub struct PageExtractor {
    client: Client,
}

impl PageExtractor {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor for PageExtractor {
    fn needs_full_content(&self, content: &str) -> bool {
        if content.trim().is_empty() {
            return true;
        }
        sanitizer::plain_text(content).chars().count() < MIN_CONTENT_LENGTH
    }

    fn fetch_full_content(&self, article_url: &str) -> Option<String> {
        let response = match self.client.get(article_url).send() {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %article_url, error = %e, "Full content fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url = %article_url, status = %response.status(), "Full content fetch rejected");
            return None;
        }
        let body = match response.text() {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %article_url, error = %e, "Full content body unreadable");
                return None;
            }
        };
        extract_main_content(&body, article_url)
    }
}

/// Tiered main-content extraction: `<article>`, then known content
/// containers, then the densest `<div>` holding at least two paragraphs.
pub fn extract_main_content(html: &str, base_url: &str) -> Option<String> {
    let mut document = Html::parse_document(html);

    let noise: Vec<_> = document
        .select(&NOISE_SELECTOR)
        .map(|element| element.id())
        .collect();
    for id in noise {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    if let Some(article) = document.select(&ARTICLE_SELECTOR).next() {
        if text_length(&article) >= MIN_CONTENT_LENGTH {
            debug!(url = %base_url, "Extracted content from <article>");
            return Some(sanitizer::clean(&article.inner_html(), base_url));
        }
    }

    for selector in CONTENT_SELECTORS.iter() {
        if let Some(container) = document.select(selector).next() {
            if text_length(&container) >= MIN_CONTENT_LENGTH {
                debug!(url = %base_url, "Extracted content from known container");
                return Some(sanitizer::clean(&container.inner_html(), base_url));
            }
        }
    }

    // Densest div wins; strict comparison keeps the first one in document
    // order on ties.
    let mut best: Option<ElementRef> = None;
    let mut best_length = 0;
    for div in document.select(&DIV_SELECTOR) {
        let length = text_length(&div);
        let paragraphs = div.select(&PARAGRAPH_SELECTOR).count();
        if length > best_length && paragraphs >= 2 {
            best_length = length;
            best = Some(div);
        }
    }
    if best_length >= MIN_CONTENT_LENGTH {
        if let Some(div) = best {
            debug!(url = %base_url, "Extracted content from densest div");
            return Some(sanitizer::clean(&div.inner_html(), base_url));
        }
    }

    debug!(url = %base_url, "No extraction strategy matched");
    None
}

fn text_length(element: &ElementRef) -> usize {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .count()
}
