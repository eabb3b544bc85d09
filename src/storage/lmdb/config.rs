// storage/lmdb/config.rs

use log::debug;
use lmdb_rkv::EnvironmentFlags;
use crate::config::subsystems::store::StoreConfig;

// Database names/identifiers
pub const CF_TERMS: &str = "terms";          // lowercased label -> TermRecord

// Default sizes for memory allocation
pub const DEFAULT_MAP_SIZE_MB: usize = 1024;
pub const DEFAULT_MAX_READERS: u32 = 126;
pub const DEFAULT_MAX_DBS: u32 = 4;

// Default flags
pub fn default_env_flags() -> EnvironmentFlags {
    EnvironmentFlags::NO_TLS |
    EnvironmentFlags::NO_READAHEAD
}

// Create environment options from the store configuration
pub fn create_env_options(config: &StoreConfig) -> (EnvironmentFlags, u32, u32, usize) {
    let mut flags = default_env_flags();

    if !config.use_fsync {
        flags |= EnvironmentFlags::NO_SYNC;
    }

    if config.read_only {
        flags |= EnvironmentFlags::READ_ONLY;
    }

    let max_readers = config.lmdb_max_readers.unwrap_or(DEFAULT_MAX_READERS);
    let max_dbs = config.lmdb_max_dbs.unwrap_or(DEFAULT_MAX_DBS);
    let map_size = config.lmdb_map_size_mb.unwrap_or(DEFAULT_MAP_SIZE_MB) * 1024 * 1024;

    debug!("Created LMDB environment options:");
    debug!("  Flags: {:?}", flags);
    debug!("  Max readers: {}", max_readers);
    debug!("  Max DBs: {}", max_dbs);
    debug!("  Map size: {} bytes", map_size);

    (flags, max_readers, max_dbs, map_size)
}
