//! Export configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::object::GenerationDescriptor;

/// Configuration for one export run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ExportConfig {
    /// Directory to export into. Must be absent or empty.
    pub target: PathBuf,

    /// Previous exports to hardlink from, newest first.
    #[builder(default)]
    #[serde(default)]
    pub generations: Vec<GenerationDescriptor>,

    /// Set permission bits of freshly written files from the tree mode.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub apply_modes: bool,

    /// Entries between progress events (0 = only the final event).
    #[builder(default = "256")]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_true() -> bool {
    true
}

fn default_progress_interval() -> u64 {
    256
}

impl ExportConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.target {
            Some(ref target) if target.as_os_str().is_empty() => {
                Err("Target path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Target path is required".to_string()),
        }
    }
}

impl ExportConfig {
    /// Create a new export config builder.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }

    /// Create a simple config exporting into `target` without generations.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            generations: Vec::new(),
            apply_modes: true,
            progress_interval: default_progress_interval(),
        }
    }

    /// Append an older generation to the chain.
    pub fn with_generation(mut self, generation: GenerationDescriptor) -> Self {
        self.generations.push(generation);
        self
    }

    /// Check a config that did not come from the builder.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.target.as_os_str().is_empty() {
            return Err(ExportError::InvalidConfig {
                message: "Target path cannot be empty".to_string(),
            });
        }
        if let Some(generation) = self
            .generations
            .iter()
            .find(|g| g.path.as_os_str().is_empty())
        {
            return Err(ExportError::InvalidConfig {
                message: format!("Generation {} has an empty path", generation.tree),
            });
        }
        Ok(())
    }
}
