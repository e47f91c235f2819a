//! Configuration handling for composition graphs
//!
//! Configuration is plain TOML. Every key is optional:
//!
//! ```toml
//! initial_capacity = 64
//! verify_index = true
//! max_depth = 8
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Tuning knobs for a [`CompositionGraph`](crate::CompositionGraph)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Products and ingredient edges to reserve space for up front
    pub initial_capacity: usize,

    /// Recompute and check the whole ancestor index after every accepted
    /// ingredient. Quadratic; meant for debugging.
    pub verify_index: bool,

    /// Longest allowed chain of ingredient edges, if any
    pub max_depth: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            verify_index: false,
            max_depth: None,
        }
    }
}

impl GraphConfig {
    /// Parses and validates configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, falling back to defaults when the
    /// file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph config: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load graph config: {}", path.display()))
    }

    /// Rejects settings that would make every ingredient impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
