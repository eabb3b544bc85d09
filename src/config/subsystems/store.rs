// src/config/subsystems/store.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    // Base path
    pub db_path: PathBuf,

    // Open the environment read-only (enrichment passes never write)
    pub read_only: bool,
    pub use_fsync: bool,

    // Recent lookups kept in memory (0 disables the cache)
    pub lookup_cache_entries: usize,

    // Records per write transaction when loading a term dump
    pub load_batch_size: usize,

    // LMDB-specific settings
    pub lmdb_max_readers: Option<u32>,     // Maximum number of reader slots
    pub lmdb_max_dbs: Option<u32>,         // Maximum number of named databases
    pub lmdb_map_size_mb: Option<usize>,   // Memory map size in megabytes
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("db/terms"),
            read_only: false,
            use_fsync: true,
            lookup_cache_entries: 10_000,
            load_batch_size: 1000,
            lmdb_max_readers: Some(126),
            lmdb_max_dbs: Some(4),
            lmdb_map_size_mb: Some(1024),
        }
    }
}

impl FromIni for StoreConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "store" {
            return None;
        }

        match key {
            "db_path" => {
                self.db_path = PathBuf::from(value.trim_matches('"'));
                Some(Ok(()))
            },
            "read_only" => {
                match value.parse() {
                    Ok(flag) => {
                        self.read_only = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid read_only value (must be true/false): {}", value)
                    ))),
                }
            },
            "use_fsync" => {
                match value.parse() {
                    Ok(flag) => {
                        self.use_fsync = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid use_fsync value (must be true/false): {}", value)
                    ))),
                }
            },
            "lookup_cache_entries" => {
                match value.parse() {
                    Ok(entries) => {
                        self.lookup_cache_entries = entries;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid lookup_cache_entries (must be a number): {}", value)
                    ))),
                }
            },
            "load_batch_size" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.load_batch_size = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid load_batch_size (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_max_readers" => {
                match value.parse() {
                    Ok(readers) if readers > 0 => {
                        self.lmdb_max_readers = Some(readers);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_max_readers (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_max_dbs" => {
                match value.parse() {
                    Ok(dbs) if dbs > 0 => {
                        self.lmdb_max_dbs = Some(dbs);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_max_dbs (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_map_size_mb" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.lmdb_map_size_mb = Some(size);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_map_size_mb (must be > 0): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(map_size) = self.lmdb_map_size_mb {
            if map_size < 10 {
                return Err(Error::Config(
                    "lmdb_map_size_mb should be at least 10MB".to_string()
                ));
            }
        }
        if self.load_batch_size == 0 {
            return Err(Error::Config("load_batch_size must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Same settings, opened for reading only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn describe(&self) -> String {
        format!(
            "Term store configuration:\n\
             - Database Path: {:?}\n\
             - Read Only: {}\n\
             - Sync Mode: {}\n\
             - Lookup Cache Entries: {}\n\
             - LMDB Map Size: {} MB\n\
             - LMDB Max Readers: {}",
            self.db_path,
            self.read_only,
            if self.use_fsync { "sync (fsync)" } else { "async" },
            self.lookup_cache_entries,
            self.lmdb_map_size_mb.unwrap_or(1024),
            self.lmdb_max_readers.unwrap_or(126),
        )
    }
}
