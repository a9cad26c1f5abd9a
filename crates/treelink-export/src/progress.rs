//! Export progress reporting.

use std::time::{Duration, Instant};

use treelink_core::RelativePath;

/// Progress information during an export.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Zero-based index of the current producer pass.
    pub pass: usize,
    /// Label of the current producer.
    pub producer: String,
    /// Entries resolved so far, across all passes.
    pub entries_done: u64,
    /// Entries in the exported tree.
    pub entries_total: u64,
    /// Files hardlinked so far.
    pub linked: u64,
    /// Files written fresh so far.
    pub written: u64,
    /// Content bytes written so far.
    pub bytes_written: u64,
    /// Entry being processed, if any.
    pub current_path: Option<RelativePath>,
    /// Time elapsed since the export started.
    pub elapsed: Duration,
}

impl ExportProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            pass: 0,
            producer: String::new(),
            entries_done: 0,
            entries_total: 0,
            linked: 0,
            written: 0,
            bytes_written: 0,
            current_path: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of entries resolved, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.entries_total == 0 {
            1.0
        } else {
            self.entries_done as f64 / self.entries_total as f64
        }
    }

    /// Write rate in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_written as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Check if every entry has been resolved.
    pub fn is_complete(&self) -> bool {
        self.entries_done >= self.entries_total
    }
}

impl Default for ExportProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters behind [`ExportProgress`] snapshots.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    pass: usize,
    producer: String,
    entries_done: u64,
    entries_total: u64,
    linked: u64,
    written: u64,
    bytes_written: u64,
    current_path: Option<RelativePath>,
}

impl ProgressTracker {
    pub fn new(entries_total: u64) -> Self {
        Self {
            start_time: Instant::now(),
            pass: 0,
            producer: String::new(),
            entries_done: 0,
            entries_total,
            linked: 0,
            written: 0,
            bytes_written: 0,
            current_path: None,
        }
    }

    pub fn start_pass(&mut self, pass: usize, producer: String) {
        self.pass = pass;
        self.producer = producer;
    }

    pub fn set_current_path(&mut self, path: &RelativePath) {
        self.current_path = Some(path.clone());
    }

    pub fn record_dir(&mut self) {
        self.entries_done += 1;
    }

    pub fn record_link(&mut self) {
        self.entries_done += 1;
        self.linked += 1;
    }

    pub fn record_write(&mut self, bytes: u64) {
        self.entries_done += 1;
        self.written += 1;
        self.bytes_written += bytes;
    }

    pub fn entries_done(&self) -> u64 {
        self.entries_done
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> ExportProgress {
        ExportProgress {
            pass: self.pass,
            producer: self.producer.clone(),
            entries_done: self.entries_done,
            entries_total: self.entries_total,
            linked: self.linked,
            written: self.written,
            bytes_written: self.bytes_written,
            current_path: self.current_path.clone(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
