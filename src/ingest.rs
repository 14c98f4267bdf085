//! Ingestion service - validate, classify, persist
//!
//! Single-shot synchronous flow per submission:
//! validate text -> classify -> build record -> store insert.
//!
//! Collaborators (classifier, store) are injected at construction; there
//! is no global state and no retry. A failure at any step leaves the
//! store untouched - the insert is the last step and is all-or-nothing.

use crate::classifier::Classifier;
use crate::error::ReviewError;
use crate::store::{ReviewRecord, ReviewStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Typed submission payload, validated at the boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    /// Review text; `None` and `Some("")` are both rejected
    pub review_text: Option<String>,
}

/// What the caller gets back: the verdict, not the stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub sentiment: String,
    pub confidence: f64,
}

/// Review ingestion service
///
/// Owns nothing but handles: the classifier and store are shared, and the
/// clock is injectable so tests can pin timestamps.
pub struct ReviewIngestor {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn ReviewStore>,
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl ReviewIngestor {
    /// Create an ingestor on the system clock (chrono::Utc::now)
    pub fn new(classifier: Arc<dyn Classifier>, store: Arc<dyn ReviewStore>) -> Self {
        Self::new_with_timestamp_fn(classifier, store, Box::new(|| chrono::Utc::now().timestamp()))
    }

    /// Create an ingestor with a custom timestamp function (for tests)
    pub fn new_with_timestamp_fn(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn ReviewStore>,
        now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    ) -> Self {
        Self {
            classifier,
            store,
            now_fn,
        }
    }

    /// Submit one review on behalf of an authenticated caller
    ///
    /// `caller_identity` comes from the auth provider and is stored as-is.
    /// Returns the classifier verdict on success; the full record stays
    /// internal.
    pub async fn submit_review(
        &self,
        caller_identity: &str,
        request: SubmitReviewRequest,
    ) -> Result<SubmitOutcome, ReviewError> {
        let review_text = match request.review_text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                return Err(ReviewError::Validation(
                    "review_text is required".to_string(),
                ))
            }
        };

        let verdict = self.classifier.classify(&review_text).await?;

        // created_at is the service clock at write time. The legacy system
        // back-dated this by one day; that offset was a defect and is not
        // carried forward (see DESIGN.md).
        let record = ReviewRecord {
            user_id: caller_identity.to_string(),
            review_text,
            sentiment: verdict.label.clone(),
            confidence: verdict.score,
            created_at: (self.now_fn)(),
        };

        self.store.insert(&record).await?;

        log::debug!(
            "📝 Stored review from {} ({} @ {:.2})",
            record.user_id,
            verdict.label,
            verdict.score
        );

        Ok(SubmitOutcome {
            sentiment: verdict.label,
            confidence: verdict.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classification, LexiconClassifier};
    use crate::store::SqliteReviewStore;
    use async_trait::async_trait;
    use tempfile::NamedTempFile;

    /// Classifier double that always fails
    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, ReviewError> {
            Err(ReviewError::Classification("model offline".to_string()))
        }
    }

    fn create_ingestor(
        classifier: Arc<dyn Classifier>,
    ) -> (NamedTempFile, Arc<SqliteReviewStore>, ReviewIngestor) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(SqliteReviewStore::open(temp_file.path().to_str().unwrap()).unwrap());

        let ingestor = ReviewIngestor::new_with_timestamp_fn(
            classifier,
            store.clone(),
            Box::new(|| 1_700_000_000),
        );

        (temp_file, store, ingestor)
    }

    fn request(text: &str) -> SubmitReviewRequest {
        SubmitReviewRequest {
            review_text: Some(text.to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_one_matching_record() {
        let (_temp, store, ingestor) = create_ingestor(Arc::new(LexiconClassifier::new()));

        let outcome = ingestor
            .submit_review("alice", request("Excellent product, love it"))
            .await
            .unwrap();

        assert_eq!(outcome.sentiment, "POSITIVE");
        assert!((0.0..=1.0).contains(&outcome.confidence));

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id, "alice");
        assert_eq!(all[0].review_text, "Excellent product, love it");
        assert_eq!(all[0].sentiment, outcome.sentiment);
        assert_eq!(all[0].confidence, outcome.confidence);
        assert_eq!(all[0].created_at, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_created_at_is_not_backdated() {
        let (_temp, store, ingestor) = create_ingestor(Arc::new(LexiconClassifier::new()));

        ingestor.submit_review("bob", request("fine")).await.unwrap();

        // Exactly the injected clock value - no one-day offset
        let all = store.find_all().await.unwrap();
        assert_eq!(all[0].created_at, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_mutation() {
        let (_temp, store, ingestor) = create_ingestor(Arc::new(LexiconClassifier::new()));

        let result = ingestor.submit_review("alice", request("")).await;
        assert!(matches!(result, Err(ReviewError::Validation(_))));

        let result = ingestor.submit_review("alice", request("   ")).await;
        assert!(matches!(result, Err(ReviewError::Validation(_))));

        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_text_rejected_without_mutation() {
        let (_temp, store, ingestor) = create_ingestor(Arc::new(LexiconClassifier::new()));

        let result = ingestor
            .submit_review("alice", SubmitReviewRequest { review_text: None })
            .await;
        assert!(matches!(result, Err(ReviewError::Validation(_))));

        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_classifier_failure_propagates_without_mutation() {
        let (_temp, store, ingestor) = create_ingestor(Arc::new(FailingClassifier));

        let result = ingestor.submit_review("alice", request("anything")).await;
        assert!(matches!(result, Err(ReviewError::Classification(_))));

        // No partial record
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
