// storage/mod.rs

pub mod metrics;
pub mod lmdb;
pub mod memory;

use crate::error::Result;
use crate::types::TermRecord;

pub use self::memory::MemoryTermStore;
pub use self::metrics::StoreMetricsStats;

/// Statistics about a term store
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_terms: u64,
    pub metrics: StoreMetricsStats,
}

/// The TermStore trait is the only view the enrichment pass has of the term database.
///
/// Implementations are shared by reference across worker threads, so every
/// lookup must be an independent read.
pub trait TermStore: Send + Sync {
    /// Fetch the record stored under an already normalised (lowercased) label
    fn lookup(&self, label: &str) -> Result<Option<TermRecord>>;

    /// Number of records in the store
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Get store statistics
    fn get_stats(&self) -> Result<StoreStats>;

    /// Release the connection; later lookups fail with a connection error
    fn close(&mut self) -> Result<()>;
}
