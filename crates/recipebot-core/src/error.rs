//! Error taxonomy shared by all RecipeBot crates.

use thiserror::Error;

/// Every failure a RecipeBot component can report.
///
/// Startup code treats any of these as fatal. Inside the dispatch cycle
/// the scheduler asks [`RecipeBotError::is_transient`] to decide between
/// backoff and moving on.
#[derive(Debug, Error)]
pub enum RecipeBotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Catalog malformed: {0}")]
    CatalogMalformed(String),

    /// Network or platform hiccup; worth retrying later.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The platform refused the payload; retrying the same payload is pointless.
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Image generation failed: {0}")]
    Generation(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecipeBotError {
    /// Whether the failed operation may succeed if attempted again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RecipeBotError::Delivery(_)
                | RecipeBotError::Timeout { .. }
                | RecipeBotError::CatalogUnavailable(_)
                | RecipeBotError::CatalogMalformed(_)
                | RecipeBotError::Io(_)
        )
    }
}

/// A specialized `Result` type for RecipeBot operations.
pub type Result<T> = std::result::Result<T, RecipeBotError>;
