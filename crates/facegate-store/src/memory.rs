//! In-memory access store for tests.

use crate::{AccessStats, AccessStore, StoreError};
use chrono::{DateTime, Utc};
use facegate_core::{AccessRecord, UNKNOWN_IDENTITY};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessStore {
    records: Vec<AccessRecord>,
}

impl InMemoryAccessStore {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AccessRecord] {
        &self.records
    }

    fn in_range<'a>(
        &'a self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a AccessRecord> {
        self.records
            .iter()
            .filter(move |r| r.timestamp >= since && r.timestamp < until)
    }
}

impl AccessStore for InMemoryAccessStore {
    fn append(&mut self, record: &AccessRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn stats(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<AccessStats, StoreError> {
        let mut total = 0u64;
        let mut granted = 0u64;
        let mut confidence_sum = 0.0f64;

        for record in self.in_range(since, until) {
            total += 1;
            if record.granted {
                granted += 1;
            }
            confidence_sum += record.confidence as f64;
        }

        Ok(AccessStats {
            total,
            granted,
            avg_confidence: if total == 0 {
                0.0
            } else {
                confidence_sum / total as f64
            },
        })
    }

    fn unknown_count(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self
            .in_range(since, until)
            .filter(|r| r.identity == UNKNOWN_IDENTITY)
            .count() as u64)
    }

    fn recent(&self, limit: usize) -> Result<Vec<AccessRecord>, StoreError> {
        Ok(self.records.iter().rev().take(limit).cloned().collect())
    }
}
