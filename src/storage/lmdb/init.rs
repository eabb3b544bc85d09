// storage/lmdb/init.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::num::NonZeroUsize;
use log::{info, debug, error};
use lmdb_rkv::{Environment, Database, DatabaseFlags, Error as LmdbError};
use lru::LruCache;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::config::subsystems::store::StoreConfig;
use crate::storage::metrics::StoreMetrics;

use super::LmdbTermStore;
use super::config::{create_env_options, CF_TERMS};

impl LmdbTermStore {
    /// Connects to the term database at `config.db_path`.
    ///
    /// A writable store creates the directory and the `terms` database when
    /// missing. A read-only store requires both to exist and reports anything
    /// else as a connection error.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let path_buf = config.db_path.clone();

        if !config.read_only && !path_buf.exists() {
            fs::create_dir_all(&path_buf)
                .map_err(|e| Error::storage(format!("Failed to create database directory: {}", e)))?;
        }
        if config.read_only && !path_buf.is_dir() {
            return Err(Error::connection(format!("Term database not found at {:?}", path_buf)));
        }

        let (env_flags, max_readers, max_dbs, map_size) = create_env_options(&config);

        info!(
            "Opening LMDB term store at {:?} (read_only={}, map_size={} MB, max_readers={})",
            path_buf,
            config.read_only,
            map_size / (1024 * 1024),
            max_readers
        );

        let env = Self::create_environment(&path_buf, env_flags, max_readers, max_dbs, map_size)?;
        let terms_db = Self::open_database(&env, CF_TERMS, config.read_only)?;

        let lookup_cache = NonZeroUsize::new(config.lookup_cache_entries)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));

        let store = Self {
            env: Some(Arc::new(env)),
            terms_db,
            metrics: Arc::new(StoreMetrics::default()),
            lookup_cache,
            db_path: path_buf,
            config,
        };

        debug!("Term store ready: {:?}", store);
        Ok(store)
    }

    /// Helper method to create an LMDB environment with error handling
    fn create_environment(
        path: &Path,
        flags: lmdb_rkv::EnvironmentFlags,
        max_readers: u32,
        max_dbs: u32,
        map_size: usize
    ) -> Result<Environment> {
        debug!("Creating LMDB environment at {:?}", path);

        Environment::new()
            .set_flags(flags)
            .set_max_readers(max_readers)
            .set_max_dbs(max_dbs)
            .set_map_size(map_size)
            .open(path)
            .map_err(|e| {
                match e {
                    LmdbError::Invalid | LmdbError::VersionMismatch => {
                        error!("{:?} is not a compatible LMDB environment: {}", path, e);
                        Error::connection(format!("Incompatible term database at {:?}: {}", path, e))
                    },
                    e if e.to_string().contains("busy") || e.to_string().contains("in use") => {
                        error!("LMDB environment is busy. Another process may be using it.");
                        Error::connection(format!("LMDB environment busy: {}", e))
                    },
                    _ => {
                        error!("Failed to open LMDB environment: {}", e);
                        Error::connection(format!("Failed to open LMDB environment at {:?}: {}", path, e))
                    }
                }
            })
    }

    /// Opens (or, when writable, creates) a named database
    fn open_database(env: &Environment, name: &str, read_only: bool) -> Result<Database> {
        let opened = if read_only {
            env.open_db(Some(name))
        } else {
            env.create_db(Some(name), DatabaseFlags::empty())
        };

        opened.map_err(|e| match e {
            LmdbError::NotFound => {
                error!("Database {} does not exist; load terms before enriching", name);
                Error::connection(format!("Database {} not found", name))
            },
            LmdbError::DbsFull => {
                error!("Maximum number of databases reached. Increase lmdb_max_dbs in configuration.");
                Error::Database(format!("LMDB max databases reached: {}", e))
            },
            _ => {
                error!("Failed to open database {}: {}", name, e);
                Error::Database(format!("Failed to open database {}: {}", name, e))
            }
        })
    }
}
