// src/config/subsystems/enricher.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnricherConfig {
    // Only annotations with this provenance tag are looked up
    pub provenance: String,

    // Fixed features written onto every enriched annotation
    pub major_type: String,
    pub minor_type: String,
    pub language: String,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            provenance: "organism_from_ncbi".to_string(),
            major_type: "organism".to_string(),
            minor_type: "organism_from_ncbi".to_string(),
            language: "en".to_string(),
        }
    }
}

impl FromIni for EnricherConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "enricher" {
            return None;
        }

        let value = value.trim_matches('"').to_string();
        match key {
            "provenance" => {
                self.provenance = value;
                Some(Ok(()))
            },
            "major_type" => {
                self.major_type = value;
                Some(Ok(()))
            },
            "minor_type" => {
                self.minor_type = value;
                Some(Ok(()))
            },
            "language" => {
                self.language = value;
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl EnricherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.provenance.is_empty() {
            return Err(Error::Config("enricher provenance must not be empty".to_string()));
        }
        Ok(())
    }
}
