//! Run configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! cores: 3
//! max_refinement_rounds: 64
//! ```
//!
//! Every field is optional; absent fields fall back to their defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

// ── Private YAML deserialization type ─────────────────────────────────────────

/// On-disk layout.  Kept private; callers work with [`RunConfig`].
#[derive(Debug, Deserialize)]
struct RunConfigFile {
    #[serde(default = "default_cores")]
    cores: usize,
    #[serde(default = "default_refinement_rounds")]
    max_refinement_rounds: usize,
}

fn default_cores() -> usize {
    3
}

fn default_refinement_rounds() -> usize {
    64
}

// ── Public configuration ──────────────────────────────────────────────────────

/// Parameters of one scheduling run that are not part of the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of identical cores in the fabric.
    pub cores: usize,

    /// Upper bound on accelerate-and-replan refinement rounds.  Refinement
    /// terminates on its own; the cap guards against pathological inputs.
    pub max_refinement_rounds: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cores: default_cores(),
            max_refinement_rounds: default_refinement_rounds(),
        }
    }
}

impl RunConfig {
    /// Parse `path` as a YAML run configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is
    /// structurally invalid.  A missing field is not an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot open configuration file: {}", path.display()))?;

        let file: RunConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML file: {}", path.display()))?;

        let config = Self {
            cores: file.cores,
            max_refinement_rounds: file.max_refinement_rounds,
        };
        info!(
            cores = config.cores,
            max_refinement_rounds = config.max_refinement_rounds,
            "run configuration loaded from {}",
            path.display()
        );
        Ok(config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
