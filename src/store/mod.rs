//! Review store - persisted collection of review records
//!
//! The store is the single source of truth. Insert is the only mutating
//! operation; every read re-queries current state (no caching layer).
//!
//! ## Module Organization
//!
//! - `mod` - record types and the `ReviewStore` trait
//! - `sqlite` - SQLite implementation and schema migration runner

pub mod sqlite;

use crate::error::ReviewError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use sqlite::{run_schema_migrations, SqliteReviewStore};

/// One submitted review with its computed sentiment
///
/// Immutable once created: no update or delete path exists. Duplicate
/// text/user/time combinations are legal - the store enforces no
/// uniqueness across records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Opaque caller identity from the auth provider, never empty
    pub user_id: String,
    /// Raw review text, non-empty (validated by the ingestion service)
    pub review_text: String,
    /// Classifier label: POSITIVE, NEGATIVE, or any other label the
    /// classifier emits (e.g. NEUTRAL)
    pub sentiment: String,
    /// Classifier confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Unix seconds UTC, assigned by the ingestion service at write time
    pub created_at: i64,
}

/// One (day, sentiment) group with its review count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentimentCount {
    /// UTC calendar day of created_at, formatted YYYY-MM-DD
    pub day: String,
    pub sentiment: String,
    pub count: i64,
}

/// Create/read access to the persisted review collection
///
/// No validation happens here - callers (the ingestion service) must have
/// already validated input. Durability failures surface as
/// `ReviewError::Storage`; an empty result set is a normal outcome.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a record, returning the storage-assigned row id
    async fn insert(&self, record: &ReviewRecord) -> Result<i64, ReviewError>;

    /// Every stored record, order unspecified
    async fn find_all(&self) -> Result<Vec<ReviewRecord>, ReviewError>;

    /// Up to `limit` records, most recent first
    ///
    /// Ties on created_at are broken by insertion order (row id ascending):
    /// of two records created in the same second, the earlier insert sorts
    /// first. Documented here and pinned by test.
    async fn find_sorted_by_created_at_desc(
        &self,
        limit: usize,
    ) -> Result<Vec<ReviewRecord>, ReviewError>;

    /// Records with `start_ts <= created_at <= end_ts`, both ends
    /// inclusive, order unspecified
    async fn find_by_date_range(
        &self,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<ReviewRecord>, ReviewError>;

    /// Counts grouped by (UTC calendar day, sentiment), ordered by day ASC
    async fn aggregate_by_day_sentiment(&self) -> Result<Vec<DailySentimentCount>, ReviewError>;
}
