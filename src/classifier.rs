//! Sentiment classifier capability
//!
//! The classifier is an external collaborator: the ingestion service calls
//! it synchronously and treats any failure as fatal to the request (no
//! retry). Two implementations:
//!
//! - `HttpClassifier` - remote model endpoint (the production path)
//! - `LexiconClassifier` - in-process keyword scorer, used when no
//!   endpoint is configured and as the deterministic test double

use crate::error::ReviewError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classifier verdict: a label plus a confidence score in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

/// Capability consumed by the ingestion service
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ReviewError>;
}

/// Remote sentiment model over HTTP
///
/// POSTs `{"text": ...}` to the configured endpoint and expects a
/// `{"label": ..., "score": ...}` response. The request timeout belongs to
/// this collaborator, not the core - a timed-out submission produces no
/// partial review record because the store insert never runs.
pub struct HttpClassifier {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

impl HttpClassifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ReviewError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReviewError::Classification(format!("client build failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ReviewError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| ReviewError::Classification(format!("classifier unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ReviewError::Classification(format!(
                "classifier returned {}",
                response.status()
            )));
        }

        let verdict: Classification = response
            .json()
            .await
            .map_err(|e| ReviewError::Classification(format!("malformed verdict: {}", e)))?;

        if !(0.0..=1.0).contains(&verdict.score) {
            return Err(ReviewError::Classification(format!(
                "score {} outside [0, 1]",
                verdict.score
            )));
        }

        Ok(verdict)
    }
}

/// Rule-based keyword classifier
///
/// Counts positive and negative cue words (with simple negation flipping)
/// and maps the balance to POSITIVE / NEGATIVE / NEUTRAL. Confidence grows
/// with the margin between the two counts.
pub struct LexiconClassifier {
    positive: Vec<&'static str>,
    negative: Vec<&'static str>,
    negations: Vec<&'static str>,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            positive: vec![
                "great", "good", "excellent", "amazing", "love", "loved", "wonderful",
                "fantastic", "perfect", "best", "happy", "awesome", "recommend", "pleased",
                "delightful", "satisfied", "superb", "enjoyable", "impressive", "works",
            ],
            negative: vec![
                "bad", "terrible", "awful", "horrible", "hate", "hated", "worst",
                "disappointing", "disappointed", "broken", "useless", "poor", "waste",
                "refund", "defective", "slow", "annoying", "unusable", "regret", "faulty",
            ],
            negations: vec!["not", "never", "no", "hardly", "barely", "isn't", "wasn't", "don't"],
        }
    }

    fn score_text(&self, text: &str) -> (i32, i32) {
        let mut positive_hits = 0;
        let mut negative_hits = 0;
        let mut negated = false;

        for raw in text.split_whitespace() {
            let word: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
                .to_lowercase();

            if self.negations.contains(&word.as_str()) {
                negated = true;
                continue;
            }

            if self.positive.contains(&word.as_str()) {
                if negated {
                    negative_hits += 1;
                } else {
                    positive_hits += 1;
                }
                negated = false;
            } else if self.negative.contains(&word.as_str()) {
                if negated {
                    positive_hits += 1;
                } else {
                    negative_hits += 1;
                }
                negated = false;
            }
        }

        (positive_hits, negative_hits)
    }
}

#[async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ReviewError> {
        let (positive_hits, negative_hits) = self.score_text(text);

        let margin = (positive_hits - negative_hits).abs() as f64;
        let total = (positive_hits + negative_hits) as f64;

        let (label, score) = if positive_hits > negative_hits {
            ("POSITIVE", 0.5 + 0.5 * margin / total)
        } else if negative_hits > positive_hits {
            ("NEGATIVE", 0.5 + 0.5 * margin / total)
        } else {
            ("NEUTRAL", 0.5)
        };

        Ok(Classification {
            label: label.to_string(),
            score: score.min(1.0),
        })
    }
}
