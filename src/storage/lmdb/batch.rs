// storage/lmdb/batch.rs

use log::{info, debug, warn};
use lmdb_rkv::{WriteFlags, Transaction, Error as LmdbError};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::types::TermRecord;

use super::LmdbTermStore;

// Constants for transaction retry logic
const MAX_RETRY_ATTEMPTS: usize = 5;
const BASE_RETRY_DELAY_MS: u64 = 10;

impl LmdbTermStore {
    /// Writes records in transactions of `load_batch_size`, keyed by lowercased label.
    ///
    /// A later record with the same key replaces the earlier one. Returns the
    /// number of records written.
    pub fn load_records<I>(&mut self, records: I) -> Result<u64>
    where
        I: IntoIterator<Item = TermRecord>,
    {
        if self.config.read_only {
            return Err(Error::storage(format!("term store at {:?} is read-only", self.db_path)));
        }

        let start_time = Instant::now();
        let batch_size = self.config.load_batch_size.max(1);
        let mut pending = Vec::with_capacity(batch_size);
        let mut written = 0u64;

        for record in records {
            pending.push(record);
            if pending.len() >= batch_size {
                written += self.store_records_batch(&pending)?;
                pending.clear();
            }
        }
        if !pending.is_empty() {
            written += self.store_records_batch(&pending)?;
        }

        // Cached misses may now be hits
        self.clear_cache();

        info!("Loaded {} term records into {:?} in {:?}", written, self.db_path, start_time.elapsed());
        Ok(written)
    }

    /// Stores one batch of records in a single write transaction
    pub(crate) fn store_records_batch(&self, chunk: &[TermRecord]) -> Result<u64> {
        debug!("Storing batch of {} term records", chunk.len());

        let serialized = chunk.iter()
            .map(|record| Ok((Self::create_term_key(&record.key()), Self::serialize_record(record)?)))
            .collect::<Result<Vec<_>>>()?;

        let env = self.env()?;
        let mut attempt = 0;

        while attempt < MAX_RETRY_ATTEMPTS {
            attempt += 1;

            let mut txn = match env.begin_rw_txn() {
                Ok(txn) => txn,
                Err(e) if should_retry_transaction_error(&e) && attempt < MAX_RETRY_ATTEMPTS => {
                    debug!("Transaction start failed (attempt {}), retrying: {}", attempt, e);
                    apply_retry_backoff(attempt);
                    continue;
                },
                Err(e) => return Err(Error::Database(format!("Failed to start write transaction: {}", e))),
            };

            for (key, value) in &serialized {
                if let Err(e) = txn.put(self.terms_db, key, value, WriteFlags::empty()) {
                    txn.abort();
                    self.metrics.increment_failed_ops();
                    if let LmdbError::MapFull = e {
                        return Err(Error::Database(
                            "LMDB map full. Increase lmdb_map_size_mb in configuration.".to_string()
                        ));
                    }
                    return Err(Error::Database(format!("Failed to store term: {}", e)));
                }
            }

            match txn.commit() {
                Ok(()) => {
                    if attempt > 1 {
                        debug!("Transaction succeeded after {} attempts", attempt);
                    }
                    self.metrics.record_writes(chunk.len() as u64);
                    return Ok(chunk.len() as u64);
                },
                Err(e) if should_retry_transaction_error(&e) && attempt < MAX_RETRY_ATTEMPTS => {
                    debug!("Transaction commit failed (attempt {}), retrying: {}", attempt, e);
                    apply_retry_backoff(attempt);
                },
                Err(e) => {
                    self.metrics.increment_failed_ops();
                    return Err(Error::Database(format!("Failed to commit transaction: {}", e)));
                }
            }
        }

        warn!("Giving up on term batch after {} attempts", MAX_RETRY_ATTEMPTS);
        Err(Error::Database(format!("Failed to complete transaction after {} attempts", MAX_RETRY_ATTEMPTS)))
    }
}

fn should_retry_transaction_error(error: &LmdbError) -> bool {
    matches!(error, LmdbError::ReadersFull | LmdbError::MapResized | LmdbError::TxnFull)
}

fn apply_retry_backoff(attempt: usize) {
    let delay = BASE_RETRY_DELAY_MS * (1 << attempt.min(6)) as u64;
    std::thread::sleep(Duration::from_millis(delay));
}
