use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::FeedSource;

/// Sources every instance starts with, in display order.
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("Hacker News", "https://news.ycombinator.com/rss"),
    ("The Verge", "https://www.theverge.com/rss/index.xml"),
    ("Wired", "https://www.wired.com/feed/rss"),
    ("TechCrunch", "https://techcrunch.com/feed/"),
];

/// Built-in sources plus a lock-guarded, insertion-ordered list of custom
/// subscriptions. Removal only ever touches the custom list. Clones share
/// the same underlying list.
#[derive(Clone)]
pub struct SourceRegistry {
    custom: Arc<RwLock<Vec<FeedSource>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            custom: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a custom source, updating the URL in place when the name is
    /// already taken (including a built-in name, which it then overrides).
    pub fn add(&self, name: &str, url: &str) {
        let mut custom = self.custom.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = custom.iter_mut().find(|source| source.name == name) {
            existing.url = url.to_string();
        } else {
            custom.push(FeedSource::new(name.to_string(), url.to_string()));
        }
    }

    /// Remove a custom source by name. Built-ins cannot be removed.
    pub fn remove(&self, name: &str) -> bool {
        let mut custom = self.custom.write().unwrap_or_else(PoisonError::into_inner);
        let before = custom.len();
        custom.retain(|source| source.name != name);
        custom.len() < before
    }

    pub fn custom_sources(&self) -> Vec<FeedSource> {
        self.custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All sources in display order: built-ins first (with any same-name
    /// custom override applied in place), then the remaining customs in
    /// insertion order.
    pub fn all(&self) -> Vec<FeedSource> {
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);

        let mut sources: Vec<FeedSource> = DEFAULT_SOURCES
            .iter()
            .map(|&(name, url)| {
                let url = custom
                    .iter()
                    .find(|source| source.name == name)
                    .map(|source| source.url.as_str())
                    .unwrap_or(url);
                FeedSource::new(name.to_string(), url.to_string())
            })
            .collect();

        for source in custom.iter() {
            if !DEFAULT_SOURCES.iter().any(|(name, _)| *name == source.name) {
                sources.push(source.clone());
            }
        }
        sources
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.all().iter().any(|source| source.url == url)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
