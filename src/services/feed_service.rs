use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::domain::{ArticleRecord, FeedSource};
use crate::errors::NewsflowResult;
use crate::ingest::FeedFetcher;
use crate::sources::SourceRegistry;
use crate::storage::ArticleStore;

/// Ties the source registry, the fetcher, and the article store together.
/// Clones share all three.
#[derive(Clone)]
pub struct FeedService {
    registry: SourceRegistry,
    fetcher: FeedFetcher,
    store: Arc<dyn ArticleStore>,
}

impl FeedService {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        let fetcher = FeedFetcher::new(store.clone());
        Self::with_parts(SourceRegistry::new(), fetcher, store)
    }

    pub fn with_parts(
        registry: SourceRegistry,
        fetcher: FeedFetcher,
        store: Arc<dyn ArticleStore>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
        }
    }

    /// Validate the URL and register it under `name`, or under the feed's
    /// own title when no usable name is given, then fetch it right away.
    /// Absence means the URL did not validate as a feed.
    pub fn add_source(&self, name: Option<&str>, url: &str) -> Option<String> {
        let feed_title = self.fetcher.validate_feed(url)?;
        let name = match name {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => feed_title,
        };
        self.registry.add(&name, url);
        info!(source = %name, url = %url, "Added source");
        self.fetcher.fetch(url, &name);
        Some(name)
    }

    pub fn validate_source(&self, url: &str) -> Option<String> {
        self.fetcher.validate_feed(url)
    }

    /// Remove a custom source. Built-ins stay.
    pub fn remove_source(&self, name: &str) -> bool {
        let removed = self.registry.remove(name);
        if removed {
            info!(source = %name, "Removed source");
        }
        removed
    }

    pub fn all_sources(&self) -> Vec<FeedSource> {
        self.registry.all()
    }

    pub fn custom_sources(&self) -> Vec<FeedSource> {
        self.registry.custom_sources()
    }

    pub fn has_source_url(&self, url: &str) -> bool {
        self.registry.contains_url(url)
    }

    /// Fetch every configured source once, each on its own thread. A
    /// source that fails contributes zero; the rest are unaffected.
    pub fn fetch_all_feeds(&self) -> Vec<(FeedSource, usize)> {
        let sources = self.registry.all();
        info!(count = sources.len(), "Fetching all feeds");

        thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|source| scope.spawn(move || self.fetcher.fetch(&source.url, &source.name)))
                .collect();

            sources
                .iter()
                .cloned()
                .zip(handles)
                .map(|(source, handle)| {
                    let saved = handle.join().unwrap_or_else(|_| {
                        warn!(source = %source.name, "Fetch worker panicked");
                        0
                    });
                    (source, saved)
                })
                .collect()
        })
    }

    /// Everything stored so far, oldest first.
    pub fn recent_articles(&self) -> NewsflowResult<Vec<ArticleRecord>> {
        self.store.find_all()
    }

    pub fn article_count(&self) -> NewsflowResult<usize> {
        self.store.count()
    }
}
