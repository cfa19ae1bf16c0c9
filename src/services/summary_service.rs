use tracing::warn;

use crate::domain::{SummaryArticle, SummaryStatus};
use crate::errors::NewsflowResult;

/// Produces summary text for an article. Kept behind a trait so a real
/// model integration can replace the dev stub.
pub trait SummaryProvider {
    fn summarize(&self, article_id: &str) -> NewsflowResult<String>;
}

/// Deterministic stand-in provider used until a real integration lands.
pub struct DevSummaryProvider;

impl SummaryProvider for DevSummaryProvider {
    fn summarize(&self, article_id: &str) -> NewsflowResult<String> {
        Ok(format!("summary for {}", article_id))
    }
}

pub struct SummaryJob<P: SummaryProvider> {
    provider: P,
}

impl<P: SummaryProvider> SummaryJob<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Run the provider for one article and record the outcome on it.
    pub fn run(&self, article: SummaryArticle) -> SummaryArticle {
        match self.provider.summarize(&article.id) {
            Ok(summary) => SummaryArticle {
                id: article.id,
                status: SummaryStatus::Succeeded,
                summary_text: Some(summary),
            },
            Err(e) => {
                warn!(article = %article.id, error = %e, "Summary provider failed");
                SummaryArticle {
                    id: article.id,
                    status: SummaryStatus::Failed,
                    summary_text: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NewsflowError;

    struct FailingProvider;

    impl SummaryProvider for FailingProvider {
        fn summarize(&self, _article_id: &str) -> NewsflowResult<String> {
            Err(NewsflowError::InvalidInput("provider offline".to_string()))
        }
    }

    #[test]
    fn test_pending_article_succeeds() {
        let job = SummaryJob::new(DevSummaryProvider);
        let article = SummaryArticle::pending("article-1".to_string());
        assert_eq!(article.status, SummaryStatus::Pending);

        let done = job.run(article);

        assert_eq!(done.status, SummaryStatus::Succeeded);
        assert_eq!(done.summary_text.as_deref(), Some("summary for article-1"));
    }

    #[test]
    fn test_provider_failure_marks_failed() {
        let job = SummaryJob::new(FailingProvider);

        let done = job.run(SummaryArticle::pending("article-2".to_string()));

        assert_eq!(done.status, SummaryStatus::Failed);
        assert_eq!(done.summary_text, None);
    }
}
