use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fully processed article as it lives in the store and on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub title: String,
    pub link: String,
    pub source: String,
    pub published_date: DateTime<Utc>,
    pub summary: String,
    pub content: String,
    pub image_url: Option<String>,
}

impl ArticleRecord {
    pub fn new(title: String, link: String, source: String) -> Self {
        Self {
            title,
            link,
            source,
            published_date: Utc::now(),
            summary: String::new(),
            content: String::new(),
            image_url: None,
        }
    }
}
