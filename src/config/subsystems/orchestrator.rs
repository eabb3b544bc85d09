// src/config/subsystems/orchestrator.rs

use std::time::Duration;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

const MAX_AUTO_WORKERS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    // Annotations handed to a worker at once
    pub batch_size: usize,

    // Worker threads per pass (0 = one per CPU, capped)
    pub workers: usize,

    // Batches buffered in the queue ahead of the workers (0 = twice the worker count)
    pub queue_capacity: usize,

    // Abort the pass when it runs longer than this
    pub timeout_secs: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            workers: 0,
            queue_capacity: 0,
            timeout_secs: None,
        }
    }
}

impl FromIni for OrchestratorConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "orchestrator" {
            return None;
        }

        match key {
            "batch_size" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.batch_size = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid batch_size (must be > 0): {}", value)
                    ))),
                }
            },
            "workers" => {
                match value.parse() {
                    Ok(count) => {
                        self.workers = count;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid workers (must be a number, 0 for auto): {}", value)
                    ))),
                }
            },
            "queue_capacity" => {
                match value.parse() {
                    Ok(capacity) => {
                        self.queue_capacity = capacity;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid queue_capacity (must be a number, 0 for auto): {}", value)
                    ))),
                }
            },
            "timeout_secs" => {
                match value.parse::<u64>() {
                    Ok(0) => {
                        self.timeout_secs = None;
                        Some(Ok(()))
                    },
                    Ok(secs) => {
                        self.timeout_secs = Some(secs);
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid timeout_secs (must be a number, 0 for none): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Worker count after resolving the automatic setting.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            num_cpus::get().clamp(1, MAX_AUTO_WORKERS)
        }
    }

    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity > 0 {
            self.queue_capacity
        } else {
            self.effective_workers() * 2
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_batches_of_five() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.batch_size, 5);
        assert!(config.effective_workers() >= 1);
        assert!(config.effective_workers() <= MAX_AUTO_WORKERS);
        assert_eq!(config.effective_queue_capacity(), config.effective_workers() * 2);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let mut config = OrchestratorConfig::default();
        config.from_ini_section("orchestrator", "timeout_secs", "30").unwrap().unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        config.from_ini_section("orchestrator", "timeout_secs", "0").unwrap().unwrap();
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = OrchestratorConfig::default();
        assert!(config.from_ini_section("orchestrator", "batch_size", "0").unwrap().is_err());
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
