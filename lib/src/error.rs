/// Custom error type for the tsundoku library
///
/// Using `thiserror` for automatic `Error` trait implementation and `From`
/// conversions.
#[derive(Debug, thiserror::Error)]
pub enum TsundokuError {
    /// Database-related errors (SQLite)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTML parsing errors
    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(String),

    /// YAML parsing/serialization errors
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A bookmark with the same URL already exists
    #[error("A bookmark with URL '{0}' already exists")]
    DuplicateUrl(String),

    /// Bookmark not found
    #[error("Bookmark {0} not found")]
    BookmarkNotFound(i64),

    /// Remote store errors (sync target unreachable, malformed, ...)
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Generic error for cases that don't fit other categories
    #[error("{0}")]
    Other(String),
}

/// Result type alias using TsundokuError
pub type Result<T> = std::result::Result<T, TsundokuError>;

impl From<String> for TsundokuError {
    fn from(s: String) -> Self {
        TsundokuError::Other(s)
    }
}

impl From<&str> for TsundokuError {
    fn from(s: &str) -> Self {
        TsundokuError::Other(s.to_string())
    }
}

impl From<serde_yaml::Error> for TsundokuError {
    fn from(err: serde_yaml::Error) -> Self {
        TsundokuError::Yaml(err.to_string())
    }
}

impl From<serde_json::Error> for TsundokuError {
    fn from(err: serde_json::Error) -> Self {
        TsundokuError::Json(err.to_string())
    }
}

impl From<tl::ParseError> for TsundokuError {
    fn from(err: tl::ParseError) -> Self {
        TsundokuError::HtmlParse(err.to_string())
    }
}
