//! Dashboard Binary - read-side analytics queries
//!
//! One-shot queries over the review store, printed as JSON to stdout.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin dashboard -- distribution
//! cargo run --release --bin dashboard -- recent
//! cargo run --release --bin dashboard -- range 2024-01-01 2024-01-03
//! ```
//!
//! ## Environment Variables
//!
//! - SENTIFLOW_DB_PATH - SQLite database path (default: data/sentiflow.db)
//! - RUST_LOG - Logging level (optional, default: info)

use sentiflow::analytics::{DateRangeQuery, SentimentAnalytics};
use sentiflow::config::SentiflowConfig;
use sentiflow::store::{ReviewStore, SqliteReviewStore};
use std::env;
use std::sync::Arc;

fn usage() -> ! {
    eprintln!("Usage: dashboard <distribution | recent | range <start> <end>>");
    eprintln!("Dates are YYYY-MM-DD, both boundary days inclusive.");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SentiflowConfig::from_env()?;

    let store: Arc<dyn ReviewStore> = Arc::new(SqliteReviewStore::new(&config.db_path)?);
    let analytics = SentimentAnalytics::new(store);

    let args: Vec<String> = env::args().collect();

    let output = match args.get(1).map(|s| s.as_str()) {
        Some("distribution") => {
            let distribution = analytics.sentiment_distribution().await?;
            serde_json::to_string_pretty(&distribution)?
        }
        Some("recent") => {
            let feed = analytics.recent_reviews().await?;
            serde_json::to_string_pretty(&feed)?
        }
        Some("range") => {
            let (start, end) = match (args.get(2), args.get(3)) {
                (Some(start), Some(end)) => (start.clone(), end.clone()),
                _ => usage(),
            };

            let query = DateRangeQuery {
                start_date: start,
                end_date: end,
            };

            let reviews = analytics.reviews_in_range(&query).await?;
            serde_json::to_string_pretty(&reviews)?
        }
        _ => usage(),
    };

    println!("{}", output);

    Ok(())
}
