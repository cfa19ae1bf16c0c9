pub mod extractor;
pub mod fetcher;
pub mod parser;
pub mod sanitizer;

/// User-Agent sent with every outbound request.
pub const USER_AGENT: &str = "Newsflow/1.0 RSS Reader";

pub use extractor::{ContentExtractor, PageExtractor, MIN_CONTENT_LENGTH};
pub use fetcher::FeedFetcher;
pub use parser::{parse_feed, ParsedFeed, RawArticle};
