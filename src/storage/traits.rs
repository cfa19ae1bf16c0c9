use crate::domain::ArticleRecord;
use crate::errors::NewsflowResult;

#[cfg_attr(test, mockall::automock)]
pub trait ArticleStore: Send + Sync {
    /// Append a record unconditionally.
    fn save(&self, record: ArticleRecord) -> NewsflowResult<()>;

    /// Append unless a record with the same link already exists. The check
    /// and the append happen under one lock, so concurrent callers racing
    /// on the same link store it exactly once. Returns whether this call
    /// stored the record.
    fn save_if_new(&self, record: ArticleRecord) -> NewsflowResult<bool>;

    fn exists_by_url(&self, link: &str) -> NewsflowResult<bool>;

    /// All records, oldest first.
    fn find_all(&self) -> NewsflowResult<Vec<ArticleRecord>>;

    fn count(&self) -> NewsflowResult<usize>;
}
