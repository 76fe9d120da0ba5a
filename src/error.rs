#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The data store could not be reached or timed out; the caller may retry.
    #[error("Catalog fetch failed: {0}")]
    TransientFetch(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl StorefrontError {
    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorefrontError::TransientFetch(_) => true,
            StorefrontError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
