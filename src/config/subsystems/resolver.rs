// src/config/subsystems/resolver.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    // Furthest the resolver walks left looking for the token that covers a span start
    pub max_walk_back: u64,

    // Upper bound on lookups per span, covering walk-back, gap skips and stitched tokens
    pub max_steps: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_walk_back: 256,
            max_steps: 4096,
        }
    }
}

impl FromIni for ResolverConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "resolver" {
            return None;
        }

        match key {
            "max_walk_back" => {
                match value.parse() {
                    Ok(distance) if distance > 0 => {
                        self.max_walk_back = distance;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid max_walk_back (must be > 0): {}", value)
                    ))),
                }
            },
            "max_steps" => {
                match value.parse() {
                    Ok(steps) if steps > 0 => {
                        self.max_steps = steps;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid max_steps (must be > 0): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_walk_back == 0 {
            return Err(Error::Config("max_walk_back must be greater than 0".to_string()));
        }
        if self.max_steps == 0 {
            return Err(Error::Config("max_steps must be greater than 0".to_string()));
        }
        Ok(())
    }
}
