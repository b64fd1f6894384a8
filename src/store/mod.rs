//! SQLite-backed trend store.
//!
//! Holds the tracked entities, their topics, and one scored trend row per
//! (topic, day, top name). Thread-safe via an internal `Mutex<Connection>`.

mod schema;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::config::TopicSpec;
use crate::error::{Result, ScoutError};
use schema::apply_schema;

/// Storage format of the `period` column.
const PERIOD_FORMAT: &str = "%Y-%m-%d";

/// A trend observation to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrend<'a> {
    /// Topic row id from [`TrendStore::ensure_topic`].
    pub topic_id: i64,
    /// Day bucket.
    pub period: NaiveDate,
    /// Topicality score.
    pub score: f64,
    /// Top name derived from the candidates.
    pub top_name: &'a str,
}

/// A recorded trend row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRecord {
    /// Row id.
    pub id: i64,
    /// Topic row id.
    pub topic_id: i64,
    /// Day bucket.
    pub period: NaiveDate,
    /// Topicality score.
    pub score: f64,
    /// Top name.
    pub top_name: String,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// SQLite trend store.
pub struct TrendStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl TrendStore {
    /// Open (or create) the database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        tracing::debug!(path = %path.display(), "trend store opened");
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert the entity and topic if missing and return the topic id.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Store`] on database failure.
    pub fn ensure_topic(&self, spec: &TopicSpec) -> Result<i64> {
        let conn = self.lock()?;
        let now = now_rfc3339();

        conn.execute(
            "INSERT INTO entities (name, kind, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) \
             ON CONFLICT (name, kind) DO NOTHING",
            params![spec.entity_name, spec.entity_kind, now],
        )?;
        let entity_id: i64 = conn.query_row(
            "SELECT id FROM entities WHERE name = ?1 AND kind = ?2",
            params![spec.entity_name, spec.entity_kind],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO entity_topics (entity_id, topic, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) \
             ON CONFLICT (entity_id, topic) DO NOTHING",
            params![entity_id, spec.topic, now],
        )?;
        let topic_id = conn.query_row(
            "SELECT id FROM entity_topics WHERE entity_id = ?1 AND topic = ?2",
            params![entity_id, spec.topic],
            |row| row.get(0),
        )?;
        Ok(topic_id)
    }

    /// Returns `true` if a trend with this key is already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Store`] on database failure.
    pub fn trend_exists(&self, topic_id: i64, period: NaiveDate, top_name: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM topic_trends WHERE topic_id = ?1 AND period = ?2 AND top_name = ?3",
                params![topic_id, format_period(period), top_name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Record a trend. Returns `false` if the key already existed, in which
    /// case nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Store`] on database failure, including an
    /// unknown topic id.
    pub fn record_trend(&self, trend: &NewTrend<'_>) -> Result<bool> {
        let conn = self.lock()?;
        let now = now_rfc3339();
        let inserted = conn.execute(
            "INSERT INTO topic_trends (topic_id, period, score, top_name, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT (topic_id, period, top_name) DO NOTHING",
            params![
                trend.topic_id,
                format_period(trend.period),
                trend.score,
                trend.top_name,
                now
            ],
        )?;
        Ok(inserted == 1)
    }

    /// All trends for a topic, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Store`] on database failure or a corrupt row.
    pub fn trends_for_topic(&self, topic_id: i64) -> Result<Vec<TrendRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, topic_id, period, score, top_name, created_at FROM topic_trends \
             WHERE topic_id = ?1 ORDER BY period DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![topic_id], row_to_trend)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Acquire the connection mutex.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ScoutError::Store(format!("connection lock poisoned: {e}")))
    }
}

impl std::fmt::Debug for TrendStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn row_to_trend(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrendRecord> {
    let period: String = row.get(2)?;
    let created_at: String = row.get(5)?;
    Ok(TrendRecord {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        period: NaiveDate::parse_from_str(&period, PERIOD_FORMAT)
            .map_err(|e| conversion_error(2, e))?,
        score: row.get(3)?,
        top_name: row.get(4)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(5, e))?
            .with_timezone(&Utc),
    })
}

fn conversion_error(column: usize, e: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn format_period(period: NaiveDate) -> String {
    period.format(PERIOD_FORMAT).to_string()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn topic() -> TopicSpec {
        TopicSpec::new("食べログ", "restaurant", "西日暮里")
    }

    #[test]
    fn ensure_topic_is_idempotent() {
        let store = TrendStore::open_in_memory().expect("store");
        let first = store.ensure_topic(&topic()).expect("first");
        let second = store.ensure_topic(&topic()).expect("second");
        assert_eq!(first, second);

        let other = store
            .ensure_topic(&TopicSpec::new("食べログ", "restaurant", "谷中"))
            .expect("other");
        assert_ne!(first, other);
    }

    #[test]
    fn record_then_exists() {
        let store = TrendStore::open_in_memory().expect("store");
        let topic_id = store.ensure_topic(&topic()).expect("topic");
        let period = day(2026, 10, 19);
        assert!(!store.trend_exists(topic_id, period, "A; B").expect("exists"));

        let inserted = store
            .record_trend(&NewTrend {
                topic_id,
                period,
                score: 72.0,
                top_name: "A; B",
            })
            .expect("record");
        assert!(inserted);
        assert!(store.trend_exists(topic_id, period, "A; B").expect("exists"));
        assert!(!store.trend_exists(topic_id, day(2026, 10, 20), "A; B").expect("exists"));
        assert!(!store.trend_exists(topic_id, period, "A").expect("exists"));
    }

    #[test]
    fn duplicate_record_is_not_written() {
        let store = TrendStore::open_in_memory().expect("store");
        let topic_id = store.ensure_topic(&topic()).expect("topic");
        let trend = NewTrend {
            topic_id,
            period: day(2026, 10, 19),
            score: 72.0,
            top_name: "A",
        };
        assert!(store.record_trend(&trend).expect("first"));
        assert!(
            !store
                .record_trend(&NewTrend { score: 10.0, ..trend.clone() })
                .expect("second")
        );

        let rows = store.trends_for_topic(topic_id).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 72.0);
    }

    #[test]
    fn unknown_topic_id_is_rejected() {
        let store = TrendStore::open_in_memory().expect("store");
        let result = store.record_trend(&NewTrend {
            topic_id: 999,
            period: day(2026, 10, 19),
            score: 1.0,
            top_name: "A",
        });
        assert!(matches!(result, Err(ScoutError::Store(_))));
    }

    #[test]
    fn trends_listed_newest_first() {
        let store = TrendStore::open_in_memory().expect("store");
        let topic_id = store.ensure_topic(&topic()).expect("topic");
        for (d, name) in [(17, "old"), (19, "new"), (18, "mid")] {
            store
                .record_trend(&NewTrend {
                    topic_id,
                    period: day(2026, 10, d),
                    score: 50.0,
                    top_name: name,
                })
                .expect("record");
        }
        let names: Vec<_> = store
            .trends_for_topic(topic_id)
            .expect("rows")
            .into_iter()
            .map(|r| r.top_name)
            .collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("trends.db");
        let topic_id = {
            let store = TrendStore::open(&path).expect("open");
            let topic_id = store.ensure_topic(&topic()).expect("topic");
            store
                .record_trend(&NewTrend {
                    topic_id,
                    period: day(2026, 10, 19),
                    score: 40.0,
                    top_name: "鮨 さいとう",
                })
                .expect("record");
            topic_id
        };

        let reopened = TrendStore::open(&path).expect("reopen");
        assert_eq!(reopened.path(), Some(path.as_path()));
        assert_eq!(reopened.ensure_topic(&topic()).expect("topic"), topic_id);
        let rows = reopened.trends_for_topic(topic_id).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].top_name, "鮨 さいとう");
        assert_eq!(rows[0].period, day(2026, 10, 19));
    }
}
