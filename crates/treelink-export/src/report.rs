//! Summary of a finished export.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use treelink_core::ObjectId;

/// What one producer pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    /// Producer label.
    pub label: String,
    /// File and symlink entries offered to the producer.
    pub attempted: u64,
    /// Entries the producer materialized.
    pub resolved: u64,
}

/// Result of a successful export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    /// Tree that was exported.
    pub tree: ObjectId,
    /// Directory exported into.
    pub target: PathBuf,
    /// Directories created.
    pub directories: u64,
    /// Files and symlinks hardlinked from earlier generations.
    pub files_linked: u64,
    /// Files and symlinks written from the store.
    pub files_written: u64,
    /// Content bytes written from the store.
    pub bytes_written: u64,
    /// Passes that ran, in order. Producers with nothing left to do are omitted.
    pub passes: Vec<PassStats>,
    /// Wall time of the export.
    pub duration: Duration,
    /// When the export finished.
    pub exported_at: DateTime<Utc>,
}

impl ExportReport {
    /// Total files and symlinks materialized.
    pub fn total_files(&self) -> u64 {
        self.files_linked + self.files_written
    }

    /// Share of files served by hardlinks, in `0.0..=1.0`.
    pub fn link_ratio(&self) -> f64 {
        match self.total_files() {
            0 => 0.0,
            total => self.files_linked as f64 / total as f64,
        }
    }
}
