//! Aggregation engine - read-side analytics over the review store
//!
//! Three queries built purely from store reads:
//! - distribution-by-day: per-calendar-day histogram of sentiment counts
//! - recent feed: fixed top-5 most-recent reviews
//! - range filter: reviews inside an inclusive calendar-date window
//!
//! Holds only a store handle; no storage concerns of its own, no caching.

use crate::error::ReviewError;
use crate::store::{ReviewRecord, ReviewStore};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Fixed size of the recent feed - no caller-adjustable page size
pub const RECENT_FEED_LIMIT: usize = 5;

/// Sentiment labels seeded to 0 for every reported day
///
/// Labels outside this set (e.g. NEUTRAL) appear only on days where the
/// classifier actually produced them, so inner key sets can differ across
/// days. Preserved compatibility behavior; see DESIGN.md.
pub const SEEDED_SENTIMENTS: [&str; 2] = ["POSITIVE", "NEGATIVE"];

/// Caller-supplied date window, validated before reaching the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeQuery {
    /// Start day, YYYY-MM-DD, inclusive from midnight UTC
    pub start_date: String,
    /// End day, YYYY-MM-DD, inclusive through 23:59:59 UTC
    pub end_date: String,
}

/// Read-side analytics over the review store
pub struct SentimentAnalytics {
    store: Arc<dyn ReviewStore>,
}

impl SentimentAnalytics {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Per-day sentiment histogram, ascending by day
    ///
    /// Every reported day carries at least POSITIVE and NEGATIVE keys
    /// (zero-seeded); observed counts overwrite the seeds. Days with no
    /// reviews are absent entirely - absence means no data, not zero.
    pub async fn sentiment_distribution(
        &self,
    ) -> Result<BTreeMap<String, HashMap<String, i64>>, ReviewError> {
        let groups = self.store.aggregate_by_day_sentiment().await?;

        let mut distribution: BTreeMap<String, HashMap<String, i64>> = BTreeMap::new();

        for group in groups {
            let day_counts = distribution.entry(group.day).or_insert_with(|| {
                SEEDED_SENTIMENTS
                    .iter()
                    .map(|s| (s.to_string(), 0))
                    .collect()
            });

            day_counts.insert(group.sentiment, group.count);
        }

        Ok(distribution)
    }

    /// The 5 most-recent reviews, most recent first
    ///
    /// Ties on created_at follow the store's documented insertion-order
    /// tie-break.
    pub async fn recent_reviews(&self) -> Result<Vec<ReviewRecord>, ReviewError> {
        self.store
            .find_sorted_by_created_at_desc(RECENT_FEED_LIMIT)
            .await
    }

    /// Reviews created inside the query's date window
    ///
    /// Both boundary days are fully included: the window spans start day
    /// 00:00:00 through end day 23:59:59 UTC. Result order is unspecified.
    /// Unparseable dates fail with `InvalidInput` before any store read.
    pub async fn reviews_in_range(
        &self,
        query: &DateRangeQuery,
    ) -> Result<Vec<ReviewRecord>, ReviewError> {
        let start_ts = parse_day_start(&query.start_date)?;
        let end_ts = parse_day_start(&query.end_date)? + 86_399;

        self.store.find_by_date_range(start_ts, end_ts).await
    }
}

/// Parse YYYY-MM-DD into unix seconds at midnight UTC
fn parse_day_start(day: &str) -> Result<i64, ReviewError> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| ReviewError::InvalidInput(format!("invalid date '{}': {}", day, e)))?;

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ReviewError::InvalidInput(format!("invalid date '{}'", day)))?;

    Ok(midnight.and_utc().timestamp())
}
