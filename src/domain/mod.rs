pub mod article;
pub mod draft;
pub mod source;
pub mod summary;

pub use article::ArticleRecord;
pub use draft::Draft;
pub use source::FeedSource;
pub use summary::{SummaryArticle, SummaryStatus};
