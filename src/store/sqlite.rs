//! SQLite implementation of the review store
//!
//! Single connection behind a mutex; writes serialize on the lock, reads
//! re-query current state on every call. Schema lives in `/sql/` as
//! numbered idempotent files applied by `run_schema_migrations`.

use super::{DailySentimentCount, ReviewRecord, ReviewStore};
use crate::error::ReviewError;
use async_trait::async_trait;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Run schema migrations from SQL files
///
/// Reads all .sql files from the specified directory, sorted by filename
/// (00_, 01_, ...), and executes each as a batch. All files must use
/// "IF NOT EXISTS" clauses so the loader stays idempotent.
pub fn run_schema_migrations(
    conn: &mut Connection,
    schema_dir: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema_path = Path::new(schema_dir);

    if !schema_path.exists() {
        return Err(format!("Schema directory not found: {}", schema_dir).into());
    }

    // WAL mode: readers (dashboard) don't block the ingestion writer
    conn.pragma_update(None, "journal_mode", "WAL")?;
    log::info!("📊 Enabled WAL mode for SQLite database");

    let mut sql_files: Vec<_> = fs::read_dir(schema_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    sql_files.sort_by_key(|entry| entry.file_name());

    log::info!("🔧 Running schema migrations from: {}", schema_dir);

    for entry in sql_files {
        let path = entry.path();
        let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();

        let sql_content = fs::read_to_string(&path)?;

        conn.execute_batch(&sql_content)?;
        log::info!("   └─ ✅ Applied: {}", filename);
    }

    log::info!("✅ All schema migrations completed");

    Ok(())
}

/// Embedded schema for the reviews table, mirrored from `/sql/01_reviews.sql`
///
/// Used by `SqliteReviewStore::open` so callers without a schema directory
/// (tests, ad-hoc tools) still get a usable database.
const REVIEWS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    review_text     TEXT NOT NULL,
    sentiment       TEXT NOT NULL,
    confidence      REAL NOT NULL,
    created_at      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews(created_at);
CREATE INDEX IF NOT EXISTS idx_reviews_sentiment ON reviews(sentiment);
"#;

/// SQLite-backed review store
///
/// The connection is shared behind `Arc<Mutex<...>>`; conflicting writes
/// serialize on the lock, which gives per-record atomicity for inserts.
pub struct SqliteReviewStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReviewStore {
    /// Open a store on an existing database
    ///
    /// Does NOT create the schema. Callers must have run
    /// `run_schema_migrations` (or `open` which applies the embedded schema).
    pub fn new(db_path: &str) -> Result<Self, ReviewError> {
        let conn = Connection::open(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a store and ensure the reviews schema exists
    pub fn open(db_path: &str) -> Result<Self, ReviewError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(REVIEWS_SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRecord> {
        Ok(ReviewRecord {
            user_id: row.get(0)?,
            review_text: row.get(1)?,
            sentiment: row.get(2)?,
            confidence: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn insert(&self, record: &ReviewRecord) -> Result<i64, ReviewError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO reviews (user_id, review_text, sentiment, confidence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            rusqlite::params![
                record.user_id,
                record.review_text,
                record.sentiment,
                record.confidence,
                record.created_at,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn find_all(&self) -> Result<Vec<ReviewRecord>, ReviewError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT user_id, review_text, sentiment, confidence, created_at FROM reviews",
        )?;

        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    async fn find_sorted_by_created_at_desc(
        &self,
        limit: usize,
    ) -> Result<Vec<ReviewRecord>, ReviewError> {
        let conn = self.conn.lock().unwrap();

        // id ASC tie-break = insertion order among same-second records
        let mut stmt = conn.prepare(
            "SELECT user_id, review_text, sentiment, confidence, created_at
             FROM reviews
             ORDER BY created_at DESC, id ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit as i64], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    async fn find_by_date_range(
        &self,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<ReviewRecord>, ReviewError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT user_id, review_text, sentiment, confidence, created_at
             FROM reviews
             WHERE created_at >= ?1 AND created_at <= ?2",
        )?;

        let rows = stmt.query_map([start_ts, end_ts], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    async fn aggregate_by_day_sentiment(&self) -> Result<Vec<DailySentimentCount>, ReviewError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT strftime('%Y-%m-%d', created_at, 'unixepoch') AS day,
                    sentiment,
                    COUNT(*) AS count
             FROM reviews
             GROUP BY day, sentiment
             ORDER BY day ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DailySentimentCount {
                day: row.get(0)?,
                sentiment: row.get(1)?,
                count: row.get(2)?,
            })
        })?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (NamedTempFile, SqliteReviewStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();

        let store = SqliteReviewStore::open(db_path).unwrap();
        (temp_file, store)
    }

    fn make_review(user: &str, text: &str, sentiment: &str, created_at: i64) -> ReviewRecord {
        ReviewRecord {
            user_id: user.to_string(),
            review_text: text.to_string(),
            sentiment: sentiment.to_string(),
            confidence: 0.9,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (_temp, store) = create_test_store();
        let record = make_review("alice", "great product", "POSITIVE", 1_700_000_000);

        let id = store.insert(&record).await.unwrap();
        assert!(id > 0);

        // Round trip: all fields equal, identifier aside
        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], record);
    }

    #[tokio::test]
    async fn test_duplicates_are_legal() {
        let (_temp, store) = create_test_store();
        let record = make_review("alice", "same text", "POSITIVE", 1_700_000_000);

        let id1 = store.insert(&record).await.unwrap();
        let id2 = store.insert(&record).await.unwrap();
        assert_ne!(id1, id2);

        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_reads_are_not_errors() {
        let (_temp, store) = create_test_store();

        assert!(store.find_all().await.unwrap().is_empty());
        assert!(store
            .find_sorted_by_created_at_desc(5)
            .await
            .unwrap()
            .is_empty());
        assert!(store.find_by_date_range(0, i64::MAX).await.unwrap().is_empty());
        assert!(store.aggregate_by_day_sentiment().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sorted_desc_with_limit() {
        let (_temp, store) = create_test_store();
        let base = 1_700_000_000;

        for i in 0..8 {
            let r = make_review("u", &format!("review {}", i), "POSITIVE", base + i);
            store.insert(&r).await.unwrap();
        }

        let recent = store.find_sorted_by_created_at_desc(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].created_at, base + 7);
        assert_eq!(recent[4].created_at, base + 3);
    }

    #[tokio::test]
    async fn test_sorted_desc_tie_break_is_insertion_order() {
        let (_temp, store) = create_test_store();
        let ts = 1_700_000_000;

        store.insert(&make_review("u", "first", "POSITIVE", ts)).await.unwrap();
        store.insert(&make_review("u", "second", "POSITIVE", ts)).await.unwrap();
        store.insert(&make_review("u", "third", "POSITIVE", ts)).await.unwrap();

        // Same created_at: earlier insert (lower id) sorts first
        let recent = store.find_sorted_by_created_at_desc(3).await.unwrap();
        assert_eq!(recent[0].review_text, "first");
        assert_eq!(recent[1].review_text, "second");
        assert_eq!(recent[2].review_text, "third");
    }

    #[tokio::test]
    async fn test_date_range_inclusive_both_ends() {
        let (_temp, store) = create_test_store();

        store.insert(&make_review("u", "before", "POSITIVE", 999)).await.unwrap();
        store.insert(&make_review("u", "start", "POSITIVE", 1000)).await.unwrap();
        store.insert(&make_review("u", "mid", "NEGATIVE", 1500)).await.unwrap();
        store.insert(&make_review("u", "end", "POSITIVE", 2000)).await.unwrap();
        store.insert(&make_review("u", "after", "POSITIVE", 2001)).await.unwrap();

        let hits = store.find_by_date_range(1000, 2000).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|r| r.review_text.as_str()).collect();

        assert_eq!(hits.len(), 3);
        assert!(texts.contains(&"start"));
        assert!(texts.contains(&"mid"));
        assert!(texts.contains(&"end"));
    }

    #[tokio::test]
    async fn test_aggregate_groups_by_utc_day_and_sentiment() {
        let (_temp, store) = create_test_store();

        // 2024-01-01T12:00:00Z and 2024-01-02T00:00:00Z
        let jan1_noon = 1_704_110_400;
        let jan2_midnight = 1_704_153_600;

        store.insert(&make_review("u", "a", "POSITIVE", jan1_noon)).await.unwrap();
        store.insert(&make_review("u", "b", "POSITIVE", jan1_noon + 60)).await.unwrap();
        store.insert(&make_review("u", "c", "NEGATIVE", jan1_noon + 120)).await.unwrap();
        store.insert(&make_review("u", "d", "NEGATIVE", jan2_midnight)).await.unwrap();

        let groups = store.aggregate_by_day_sentiment().await.unwrap();

        assert_eq!(groups.len(), 3);
        // Ordered by day ascending
        assert_eq!(groups[0].day, "2024-01-01");
        assert_eq!(groups[1].day, "2024-01-01");
        assert_eq!(groups[2].day, "2024-01-02");

        let jan1_pos = groups
            .iter()
            .find(|g| g.day == "2024-01-01" && g.sentiment == "POSITIVE")
            .unwrap();
        assert_eq!(jan1_pos.count, 2);

        let jan2_neg = groups
            .iter()
            .find(|g| g.day == "2024-01-02" && g.sentiment == "NEGATIVE")
            .unwrap();
        assert_eq!(jan2_neg.count, 1);
    }

    #[test]
    fn test_schema_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("migrate.db");

        let schema_dir = dir.path().join("sql");
        std::fs::create_dir(&schema_dir).unwrap();
        std::fs::write(schema_dir.join("01_reviews.sql"), REVIEWS_SCHEMA).unwrap();

        let mut conn = Connection::open(&db_path).unwrap();
        let schema_dir_str = schema_dir.to_str().unwrap();

        run_schema_migrations(&mut conn, schema_dir_str).unwrap();
        // Second run must be a no-op, not an error
        run_schema_migrations(&mut conn, schema_dir_str).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_schema_migrations_missing_dir() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = run_schema_migrations(&mut conn, "/nonexistent/schema/dir");
        assert!(result.is_err());
    }
}
