use serde::{Deserialize, Serialize};

/// An editor draft submitted for markdown export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub body: String,
    pub source_url: String,
}
