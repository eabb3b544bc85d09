// src/config/subsystems/logging.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use log::LevelFilter;
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    // Write timestamped log files here instead of stderr
    pub log_dir: Option<PathBuf>,
    #[serde(skip)]
    level_filter: Option<LevelFilter>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            level_filter: Some(LevelFilter::Info),
        }
    }
}

impl FromIni for LoggingConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "logging" {
            return None;
        }

        match key {
            "log_dir" => {
                let value = value.trim_matches('"');
                self.log_dir = if value.is_empty() { None } else { Some(PathBuf::from(value)) };
                Some(Ok(()))
            },
            "level" | "log_level" => {
                Some(
                    match value.trim_matches('"').to_lowercase().as_str() {
                        "error" => Ok(LevelFilter::Error),
                        "warn" => Ok(LevelFilter::Warn),
                        "info" => Ok(LevelFilter::Info),
                        "debug" => Ok(LevelFilter::Debug),
                        "trace" => Ok(LevelFilter::Trace),
                        "none" => Ok(LevelFilter::Off),
                        _ => Err(Error::Config(
                            format!("Invalid log level '{}'. Must be one of: none, error, warn, info, debug, trace", value)
                        )),
                    }
                    .map(|level| {
                        self.level_filter = Some(level);
                    })
                )
            },
            _ => None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }

    pub fn get_log_level(&self) -> LevelFilter {
        self.level_filter.unwrap_or(LevelFilter::Info)
    }
}
