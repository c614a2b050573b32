use thiserror::Error;

/// Errors surfaced while assembling or writing a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The requested page does not exist for the category.
    #[error("Feed page {page_id} not found for category '{category}'")]
    NotFound { page_id: u32, category: String },

    /// The request URI cannot be used to derive page addresses.
    #[error("Invalid request URI: {0}")]
    InvalidRequest(String),

    /// The backing event store failed.
    #[error("Event store error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The Atom writer failed.
    #[error("Failed to write feed document: {0}")]
    Serialize(String),
}

impl FeedError {
    pub(crate) fn not_found(page_id: u32, category: &str) -> Self {
        FeedError::NotFound {
            page_id,
            category: category.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
