//! Optional TOML configuration for the `callog` binary.
//!
//! ```toml
//! [expansion]
//! safety_cap = 10
//!
//! [conflicts]
//! batch_policy = "check-each"   # or "defer-to-backend"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use callog_engine::{BatchConflictPolicy, ExpansionOptions};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub expansion: ExpansionOptions,
    pub conflicts: ConflictConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConflictConfig {
    pub batch_policy: BatchConflictPolicy,
}

impl Config {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
