//! facegate-store — append-only access-record storage.
//!
//! One trait, two implementations: SQLite for real runs, in-memory for
//! tests. Records are appended only; nothing is ever mutated or deleted.

use chrono::{DateTime, Utc};
use facegate_core::AccessRecord;
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryAccessStore;
pub use sqlite::SqliteAccessStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Aggregate statistics over a time range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccessStats {
    pub total: u64,
    pub granted: u64,
    pub avg_confidence: f64,
}

impl AccessStats {
    pub fn denied(&self) -> u64 {
        self.total - self.granted
    }

    /// Granted share in percent; 0.0 with no records.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.granted as f64 / self.total as f64 * 100.0
        }
    }
}

/// Append-only sink of access decisions, queryable by time range.
pub trait AccessStore: Send {
    /// Append one record. Failures are recoverable: the caller logs and
    /// carries on with the next frame.
    fn append(&mut self, record: &AccessRecord) -> Result<(), StoreError>;

    /// Aggregates over `since <= timestamp < until`.
    fn stats(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<AccessStats, StoreError>;

    /// Count of unknown-identity records over `since <= timestamp < until`.
    fn unknown_count(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Most recent records, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<AccessRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(identity: &str, secs: i64, granted: bool, confidence: f32) -> AccessRecord {
        AccessRecord {
            identity: identity.to_string(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            granted,
            confidence,
            evidence_path: None,
        }
    }

    fn exercise_store(store: &mut dyn AccessStore) {
        store.append(&record("alice", 100, true, 0.9)).unwrap();
        store.append(&record("bob", 200, true, 0.8)).unwrap();
        store.append(&record("Unknown", 300, false, 0.5)).unwrap();
        store.append(&record("alice", 900, false, 0.6)).unwrap();

        let since = Utc.timestamp_opt(100, 0).unwrap();
        let until = Utc.timestamp_opt(400, 0).unwrap();

        let stats = store.stats(since, until).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.granted, 2);
        assert_eq!(stats.denied(), 1);
        assert!((stats.avg_confidence - (0.9 + 0.8 + 0.5) / 3.0).abs() < 1e-6);
        assert!((stats.success_rate() - 200.0 / 3.0).abs() < 1e-6);

        assert_eq!(store.unknown_count(since, until).unwrap(), 1);

        // Range excludes the record at t=900 and anything before t=100.
        let late = store
            .stats(
                Utc.timestamp_opt(400, 0).unwrap(),
                Utc.timestamp_opt(900, 0).unwrap(),
            )
            .unwrap();
        assert_eq!(late.total, 0);
        assert_eq!(late.success_rate(), 0.0);

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].identity, "alice");
        assert_eq!(recent[0].timestamp.timestamp(), 900);
        assert_eq!(recent[1].identity, "Unknown");
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteAccessStore::open(&dir.path().join("records.db")).unwrap();
        exercise_store(&mut store);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = InMemoryAccessStore::default();
        exercise_store(&mut store);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");

        {
            let mut store = SqliteAccessStore::open(&path).unwrap();
            let mut rec = record("alice", 100, true, 0.9);
            rec.evidence_path = Some("evidence/known_1.jpg".into());
            store.append(&rec).unwrap();
        }

        let store = SqliteAccessStore::open(&path).unwrap();
        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].identity, "alice");
        assert!(recent[0].granted);
        assert_eq!(
            recent[0].evidence_path.as_deref(),
            Some("evidence/known_1.jpg")
        );
    }

    #[test]
    fn test_stats_empty_store() {
        let store = InMemoryAccessStore::default();
        let stats = store
            .stats(Utc.timestamp_opt(0, 0).unwrap(), Utc.timestamp_opt(10, 0).unwrap())
            .unwrap();
        assert_eq!(stats, AccessStats::default());
        assert!(store.recent(5).unwrap().is_empty());
    }
}
