// storage/lmdb/query.rs

use log::{trace, warn};
use lmdb_rkv::{Transaction, Cursor, Error as LmdbError};

use crate::error::{Error, Result};
use crate::types::TermRecord;

use super::LmdbTermStore;

impl LmdbTermStore {
    /// Fetch the record stored under `label`, consulting the lookup cache first
    pub fn lookup_term(&self, label: &str) -> Result<Option<TermRecord>> {
        let env = self.env()?;

        if let Some(cache) = &self.lookup_cache {
            if let Some(cached) = cache.lock().get(label) {
                self.metrics.increment_cache_hits();
                self.metrics.record_lookup(cached.is_some());
                return Ok(cached.clone());
            }
        }

        let txn = env.begin_ro_txn()
            .map_err(|e| {
                self.metrics.increment_failed_ops();
                Error::Database(format!("Failed to start read transaction: {}", e))
            })?;

        let key = Self::create_term_key(label);
        let record = match txn.get(self.terms_db, &key) {
            Ok(bytes) => Some(Self::deserialize_record(bytes).map_err(|e| {
                self.metrics.increment_failed_ops();
                warn!("Corrupt term record for {:?}: {}", label, e);
                e
            })?),
            Err(LmdbError::NotFound) => None,
            Err(e) => {
                self.metrics.increment_failed_ops();
                return Err(Error::Database(format!("Failed to read term {:?}: {}", label, e)));
            }
        };

        // Read-only transaction, nothing to commit
        txn.abort();

        trace!("Term lookup {:?}: {}", label, if record.is_some() { "hit" } else { "miss" });
        self.metrics.record_lookup(record.is_some());

        if let Some(cache) = &self.lookup_cache {
            cache.lock().put(label.to_string(), record.clone());
        }

        Ok(record)
    }

    /// Count records in the terms database
    pub fn count_terms(&self) -> Result<u64> {
        let env = self.env()?;
        let txn = env.begin_ro_txn()
            .map_err(|e| Error::Database(format!("Failed to start read transaction: {}", e)))?;

        let mut count = 0u64;
        {
            // Cursor scope - ensure cursor is dropped before transaction ends
            let mut cursor = txn.open_ro_cursor(self.terms_db)
                .map_err(|e| Error::Database(format!("Failed to create cursor: {}", e)))?;

            for result in cursor.iter_start() {
                match result {
                    Ok(_) => count += 1,
                    Err(e) => warn!("Error iterating term cursor: {}", e),
                }
            }
        }

        txn.abort();
        Ok(count)
    }
}
