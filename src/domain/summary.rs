use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    Pending,
    Succeeded,
    Failed,
}

/// An article's summarization state as tracked by the summary job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryArticle {
    pub id: String,
    pub status: SummaryStatus,
    pub summary_text: Option<String>,
}

impl SummaryArticle {
    pub fn pending(id: String) -> Self {
        Self {
            id,
            status: SummaryStatus::Pending,
            summary_text: None,
        }
    }
}
