//! Sentiflow - sentiment review store and aggregation engine
//!
//! Records short-text reviews tagged with a classifier-produced sentiment
//! label and confidence score, persists them in SQLite, and serves
//! time-bucketed analytics over the stored set.
//!
//! ## Architecture
//!
//! ```text
//! submission (stdin line / channel)
//!     ↓
//! AuthProvider::authorize() -> caller identity
//!     ↓
//! ReviewIngestor::submit_review()
//!     ↓ Classifier::classify()        (external capability)
//!     ↓ ReviewStore::insert()         (SQLite, append-only)
//!
//! SentimentAnalytics  ── reads ──>  ReviewStore
//!   distribution-by-day / recent feed / date-range filter
//! ```
//!
//! The default binary is the ingestion runtime: it wires the collaborators
//! together (no global singletons - everything is constructed here and
//! injected), then drives submissions from stdin through an mpsc channel.
//! The `dashboard` binary serves the read side.
//!
//! ## Module Organization
//!
//! - `store` - review record model, store trait, SQLite implementation
//! - `analytics` - distribution / recent-feed / range queries
//! - `ingest` - validation, classification, persistence of submissions
//! - `classifier` - external classifier capability (HTTP + lexicon)
//! - `auth` - external auth provider capability
//! - `config` - environment-variable configuration
//! - `error` - the `ReviewError` taxonomy

pub mod analytics;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ingest;
pub mod store;

use {
    auth::{AuthProvider, Credentials, StaticAuthProvider},
    classifier::{Classifier, HttpClassifier, LexiconClassifier},
    config::SentiflowConfig,
    ingest::{ReviewIngestor, SubmitReviewRequest},
    log::{error, info, warn},
    rusqlite::Connection,
    serde::Deserialize,
    std::sync::Arc,
    std::time::Duration,
    store::{run_schema_migrations, ReviewStore, SqliteReviewStore},
    tokio::io::{AsyncBufReadExt, BufReader},
    tokio::sync::mpsc,
};

/// One line of the runtime's stdin protocol
#[derive(Debug, Deserialize)]
struct SubmissionLine {
    username: String,
    password: String,
    review_text: Option<String>,
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("🚀 Sentiflow review runtime");

    let config = SentiflowConfig::from_env()?;
    info!("   ├─ Database: {}", config.db_path);
    info!(
        "   ├─ Classifier: {}",
        config.classifier_url.as_deref().unwrap_or("lexicon (in-process)")
    );
    info!("   └─ Channel buffer: {}", config.channel_buffer);

    // Initialize database schema (idempotent)
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut conn = Connection::open(&config.db_path)?;
    run_schema_migrations(&mut conn, "sql")?;
    drop(conn);

    // Composition root: construct collaborators explicitly and inject them
    let store: Arc<dyn ReviewStore> = Arc::new(SqliteReviewStore::new(&config.db_path)?);

    let classifier: Arc<dyn Classifier> = match &config.classifier_url {
        Some(url) => Arc::new(HttpClassifier::new(
            url,
            Duration::from_secs(config.classifier_timeout_secs),
        )?),
        None => Arc::new(LexiconClassifier::new()),
    };

    let auth: Arc<dyn AuthProvider> = Arc::new(StaticAuthProvider::from_pairs(&config.auth_users));
    let ingestor = ReviewIngestor::new(classifier, store);

    info!("✅ Review store, classifier, and auth provider ready");

    let (tx, rx) = mpsc::channel::<SubmissionLine>(config.channel_buffer);

    // Reader task: one JSON object per stdin line
    // {"username": "...", "password": "...", "review_text": "..."}
    let reader_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<SubmissionLine>(&line) {
                Ok(submission) => {
                    if tx.send(submission).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("⚠️  Skipping malformed submission line: {}", e),
            }
        }
    });

    run_submission_loop(rx, &ingestor, auth).await;

    let _ = reader_handle.await;
    info!("✅ Review runtime stopped");

    Ok(())
}

/// Drain the submission channel until it closes
///
/// Each submission is authorized, then handed to the ingestor. Failures are
/// logged and never abort the loop - one bad submission must not take the
/// runtime down.
async fn run_submission_loop(
    mut rx: mpsc::Receiver<SubmissionLine>,
    ingestor: &ReviewIngestor,
    auth: Arc<dyn AuthProvider>,
) {
    let mut accepted = 0u64;

    while let Some(submission) = rx.recv().await {
        // Authenticate to obtain a token, then resolve it to the identity
        // the review is attributed to
        let credentials = Credentials {
            username: submission.username,
            password: submission.password,
        };

        let identity = match auth.authenticate(&credentials).await {
            Ok(token) => match auth.authorize(&token).await {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("⚠️  Rejected submission: {}", e);
                    continue;
                }
            },
            Err(e) => {
                warn!("⚠️  Rejected submission: {}", e);
                continue;
            }
        };

        let request = SubmitReviewRequest {
            review_text: submission.review_text,
        };

        match ingestor.submit_review(&identity, request).await {
            Ok(outcome) => {
                accepted += 1;
                info!(
                    "📝 {} -> {} ({:.2}) | total accepted: {}",
                    identity, outcome.sentiment, outcome.confidence, accepted
                );
            }
            Err(e) if e.is_caller_error() => warn!("⚠️  Rejected submission: {}", e),
            Err(e) => error!("❌ Submission failed: {}", e),
        }
    }
}
