// storage/lmdb/mod.rs

// Declare submodules
pub mod config;
pub mod init;
pub mod batch;
pub mod query;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::info;
use lru::LruCache;
use parking_lot::Mutex;
use lmdb_rkv::{Environment, Database};

use crate::error::{Error, Result};
use crate::types::TermRecord;
use crate::storage::metrics::StoreMetrics;
use crate::config::subsystems::store::StoreConfig;
use super::{StoreStats, TermStore};

/// Term database backed by an LMDB environment.
///
/// Lookups open their own read-only transaction, so one store can be shared
/// by reference across every enrichment worker.
pub struct LmdbTermStore {
    pub(crate) env: Option<Arc<Environment>>,
    pub(crate) terms_db: Database,
    pub(crate) metrics: Arc<StoreMetrics>,
    pub(crate) lookup_cache: Option<Mutex<LruCache<String, Option<TermRecord>>>>,
    pub(crate) db_path: PathBuf,
    pub(crate) config: StoreConfig,
}

// Debug impl needs to be manual due to the LMDB handles
impl std::fmt::Debug for LmdbTermStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbTermStore")
            .field("db_path", &self.db_path.display())
            .field("open", &self.env.is_some())
            .field("read_only", &self.config.read_only)
            .field("lookup_cache_size", &self.lookup_cache.as_ref().map(|c| c.lock().len()))
            .finish()
    }
}

impl LmdbTermStore {
    /// Key a record is stored under
    pub(crate) fn create_term_key(label: &str) -> Vec<u8> {
        label.as_bytes().to_vec()
    }

    pub(crate) fn serialize_record(record: &TermRecord) -> Result<Vec<u8>> {
        bincode::serialize(record)
            .map_err(|e| Error::Serialization(format!("Bincode serialization failed: {}", e)))
    }

    pub(crate) fn deserialize_record(bytes: &[u8]) -> Result<TermRecord> {
        bincode::deserialize(bytes)
            .map_err(|e| Error::Serialization(format!("Bincode deserialization failed: {}", e)))
    }

    /// Environment handle, or a connection error once the store is closed
    pub(crate) fn env(&self) -> Result<&Arc<Environment>> {
        self.env.as_ref()
            .ok_or_else(|| Error::connection(format!("term store at {:?} is closed", self.db_path)))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_open(&self) -> bool {
        self.env.is_some()
    }

    /// Drop every cached lookup result
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.lookup_cache {
            cache.lock().clear();
        }
    }
}

impl TermStore for LmdbTermStore {
    fn lookup(&self, label: &str) -> Result<Option<TermRecord>> {
        // Implemented in query.rs
        self.lookup_term(label)
    }

    fn len(&self) -> Result<u64> {
        self.count_terms()
    }

    fn get_stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_terms: self.count_terms()?,
            metrics: self.metrics.get_stats(),
        })
    }

    fn close(&mut self) -> Result<()> {
        if let Some(env) = self.env.take() {
            info!("Closing LMDB term store at {:?}", self.db_path);
            if !self.config.read_only && self.config.use_fsync {
                env.sync(true)?;
            }
            self.clear_cache();
        }
        Ok(())
    }
}

impl Drop for LmdbTermStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Error closing term store at {:?}: {}", self.db_path, e);
        }
    }
}
