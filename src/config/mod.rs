pub mod file;
pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use crate::error::Result;
use log::{warn, trace};

pub const DEFAULT_CONFIG_FILE: &str = "default.ini";

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanlinkConfig {
    // File paths
    pub files: file::FileConfig,

    // Subsystem configs
    pub index: subsystems::IndexConfig,
    pub resolver: subsystems::ResolverConfig,
    pub enricher: subsystems::EnricherConfig,
    pub orchestrator: subsystems::OrchestratorConfig,
    pub store: subsystems::StoreConfig,
    pub logging: subsystems::LoggingConfig,
}

impl SpanlinkConfig {
    pub fn validate(&self) -> Result<()> {
        self.files.validate()?;
        self.index.validate()?;
        self.resolver.validate()?;
        self.enricher.validate()?;
        self.orchestrator.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = std::fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;
        Self::from_ini_str(&content)
    }

    /// Loads `path` when given, else `default.ini` in the working directory
    /// if present, else built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_ini(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_ini(DEFAULT_CONFIG_FILE),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Parses INI text. Unknown sections and keys are logged and skipped.
    pub fn from_ini_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len()-1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Delegate to appropriate subsystem config
                if let Some(result) = match current_section.as_str() {
                    "files" | "file" => config.files.from_ini_section(&current_section, key, value),
                    "index" => config.index.from_ini_section(&current_section, key, value),
                    "resolver" => config.resolver.from_ini_section(&current_section, key, value),
                    "enricher" => config.enricher.from_ini_section(&current_section, key, value),
                    "orchestrator" => config.orchestrator.from_ini_section(&current_section, key, value),
                    "store" => config.store.from_ini_section(&current_section, key, value),
                    "logging" => config.logging.from_ini_section(&current_section, key, value),
                    _ => None,
                } {
                    if let Err(e) = result {
                        warn!("Error processing config key {}={}: {}", key, value, e);
                        return Err(e);
                    }
                } else {
                    warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::subsystems::index::DuplicatePolicy;

    #[test]
    fn parses_every_section() {
        let ini = r#"
            # enrichment settings
            [files]
            output_dir = "out/enriched"

            [index]
            duplicate_policy = reject

            [resolver]
            max_walk_back = 64

            [enricher]
            provenance = "urn:organism_from_ncbi"
            language = es

            [orchestrator]
            batch_size = 10
            workers = 3

            [store]
            db_path = "/tmp/terms"
            read_only = true

            [logging]
            level = debug
        "#;

        let config = SpanlinkConfig::from_ini_str(ini).unwrap();
        assert_eq!(config.files.output_dir, std::path::PathBuf::from("out/enriched"));
        assert_eq!(config.index.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.resolver.max_walk_back, 64);
        assert_eq!(config.enricher.provenance, "urn:organism_from_ncbi");
        assert_eq!(config.enricher.language, "es");
        assert_eq!(config.enricher.major_type, "organism");
        assert_eq!(config.orchestrator.batch_size, 10);
        assert_eq!(config.orchestrator.effective_workers(), 3);
        assert!(config.store.read_only);
        assert_eq!(config.logging.get_log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let config = SpanlinkConfig::from_ini_str("[orchestrator]\ncolour = blue\n[nowhere]\nx = 1\n").unwrap();
        assert_eq!(config.orchestrator.batch_size, 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = std::path::Path::new("/nonexistent/spanlink.ini");
        assert!(SpanlinkConfig::load(Some(missing)).is_err());
    }

    #[test]
    fn invalid_values_fail_loading() {
        assert!(SpanlinkConfig::from_ini_str("[orchestrator]\nbatch_size = none\n").is_err());
    }
}
