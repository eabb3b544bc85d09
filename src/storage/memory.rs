// storage/memory.rs

use std::sync::atomic::{AtomicBool, Ordering};
use dashmap::DashMap;
use log::debug;

use crate::error::{Error, Result};
use crate::types::TermRecord;
use super::metrics::StoreMetrics;
use super::{StoreStats, TermStore};

/// Term store held entirely in memory, keyed by lowercased label.
#[derive(Debug, Default)]
pub struct MemoryTermStore {
    terms: DashMap<String, TermRecord>,
    metrics: StoreMetrics,
    closed: AtomicBool,
}

impl MemoryTermStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TermRecord>,
    {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or replace a record under its lowercased label
    pub fn insert(&self, record: TermRecord) {
        self.metrics.record_writes(1);
        self.terms.insert(record.key(), record);
    }
}

impl TermStore for MemoryTermStore {
    fn lookup(&self, label: &str) -> Result<Option<TermRecord>> {
        if self.closed.load(Ordering::Acquire) {
            self.metrics.increment_failed_ops();
            return Err(Error::connection("in-memory term store is closed"));
        }

        let record = self.terms.get(label).map(|entry| entry.value().clone());
        self.metrics.record_lookup(record.is_some());
        Ok(record)
    }

    fn len(&self) -> Result<u64> {
        Ok(self.terms.len() as u64)
    }

    fn get_stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_terms: self.len()?,
            metrics: self.metrics.get_stats(),
        })
    }

    fn close(&mut self) -> Result<()> {
        debug!("Closing in-memory term store with {} terms", self.terms.len());
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
