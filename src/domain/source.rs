use serde::{Deserialize, Serialize};

/// A named feed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: String, url: String) -> Self {
        Self { name, url }
    }
}
