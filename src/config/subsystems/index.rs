// src/config/subsystems/index.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

/// What the token index builder does when two tokens share a start offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the last token seen and log the overwrite.
    LastWins,
    /// Fail the document.
    Reject,
}

impl DuplicatePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "last_wins" | "overwrite" => Some(Self::LastWins),
            "reject" | "strict" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::LastWins
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    pub duplicate_policy: DuplicatePolicy,
}

impl FromIni for IndexConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "index" {
            return None;
        }

        match key {
            "duplicate_policy" => Some(
                match DuplicatePolicy::from_str(value) {
                    Some(policy) => {
                        self.duplicate_policy = policy;
                        Ok(())
                    },
                    None => Err(Error::Config(
                        format!("Invalid duplicate_policy '{}'. Must be one of: last_wins, reject", value)
                    )),
                }
            ),
            _ => None,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}
