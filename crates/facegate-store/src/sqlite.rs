//! SQLite-backed access store.

use crate::{AccessStats, AccessStore, StoreError};
use chrono::{DateTime, Utc};
use facegate_core::{AccessRecord, UNKNOWN_IDENTITY};
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteAccessStore {
    conn: Connection,
}

impl SqliteAccessStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.ensure_schema()?;
        tracing::info!(db = %db_path.display(), "access store ready");
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS access_records (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              identity TEXT NOT NULL,
              recorded_at INTEGER NOT NULL,
              granted INTEGER NOT NULL,
              confidence REAL NOT NULL,
              evidence_path TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_access_recorded
              ON access_records(recorded_at);
            "#,
        )?;
        Ok(())
    }
}

impl AccessStore for SqliteAccessStore {
    fn append(&mut self, record: &AccessRecord) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO access_records(identity, recorded_at, granted, confidence, evidence_path)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.identity,
                record.timestamp.timestamp(),
                record.granted,
                record.confidence as f64,
                record.evidence_path,
            ],
        )?;
        Ok(())
    }

    fn stats(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<AccessStats, StoreError> {
        let (total, granted, avg_confidence) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(granted), 0), COALESCE(AVG(confidence), 0.0)
            FROM access_records
            WHERE recorded_at >= ?1 AND recorded_at < ?2
            "#,
            params![since.timestamp(), until.timestamp()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            },
        )?;

        Ok(AccessStats {
            total: total as u64,
            granted: granted as u64,
            avg_confidence,
        })
    }

    fn unknown_count(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM access_records
            WHERE identity = ?1 AND recorded_at >= ?2 AND recorded_at < ?3
            "#,
            params![UNKNOWN_IDENTITY, since.timestamp(), until.timestamp()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn recent(&self, limit: usize) -> Result<Vec<AccessRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT identity, recorded_at, granted, confidence, evidence_path
            FROM access_records
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (identity, recorded_at, granted, confidence, evidence_path) = row?;
            let timestamp = DateTime::<Utc>::from_timestamp(recorded_at, 0)
                .ok_or_else(|| StoreError::Corrupt(format!("bad timestamp {recorded_at}")))?;
            records.push(AccessRecord {
                identity,
                timestamp,
                granted,
                confidence: confidence as f32,
                evidence_path,
            });
        }
        Ok(records)
    }
}
