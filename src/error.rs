//! Error taxonomy for the review core
//!
//! Four kinds, matching the failure surfaces of the system:
//! - `Validation` - caller-correctable input rejection (empty review text)
//! - `Classification` - external sentiment model unavailable or errored
//! - `Storage` - persistence layer failure (open, write, read)
//! - `InvalidInput` - unparseable date in range queries
//!
//! Collaborator failures are passed through unchanged in kind; the core
//! performs no retries and leaves no partial writes behind.

/// Error type shared by the store, analytics, and ingestion layers
#[derive(Debug)]
pub enum ReviewError {
    /// Missing or empty required field, rejected before any side effect
    Validation(String),
    /// External classifier failed or returned an unusable result
    Classification(String),
    /// SQLite failure surfaced from the review store
    Storage(rusqlite::Error),
    /// Unparseable caller-supplied date (expected YYYY-MM-DD)
    InvalidInput(String),
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        ReviewError::Storage(err)
    }
}

impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ReviewError::Classification(msg) => write!(f, "Classification error: {}", msg),
            ReviewError::Storage(e) => write!(f, "Storage error: {}", e),
            ReviewError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ReviewError {}

impl ReviewError {
    /// True for errors the caller can fix by correcting the request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ReviewError::Validation(_) | ReviewError::InvalidInput(_)
        )
    }
}
