use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsflowError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Feed errors
    #[error("Feed validation failed: {0}")]
    FeedValidation(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("Malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("OPML parsing failed: {0}")]
    OpmlParse(String),

    // Serialization errors
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type NewsflowResult<T> = Result<T, NewsflowError>;
