pub mod memory;
pub mod traits;

pub use memory::InMemoryArticleStore;
pub use traits::ArticleStore;
