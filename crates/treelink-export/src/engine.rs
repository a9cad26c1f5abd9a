//! Export engine: target preparation, producer passes and failure aggregation.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use treelink_core::{ContentStore, ExportConfig, ExportError, ObjectId, TreeEntry};

use crate::producer::{GenerationProducer, Producer, Resolution, TerminalProducer, target_error};
use crate::progress::{ExportProgress, ProgressTracker};
use crate::report::{ExportReport, PassStats};
use crate::walker::walk;

/// Exports trees from a content store into fresh directories.
pub struct Exporter<'s, S: ContentStore + ?Sized> {
    store: &'s S,
    progress_tx: broadcast::Sender<ExportProgress>,
}

impl<'s, S: ContentStore + ?Sized> Exporter<'s, S> {
    /// Create a new exporter reading from `store`.
    pub fn new(store: &'s S) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { store, progress_tx }
    }

    /// Subscribe to export progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ExportProgress> {
        self.progress_tx.subscribe()
    }

    /// Export `tree` into `config.target`.
    ///
    /// Every file and symlink is hardlinked from the newest generation in
    /// `config.generations` holding identical content and mode, or written
    /// from the store when no generation has it. The tree is listed before
    /// the target is touched. The target must be absent or empty; nothing
    /// is touched otherwise. A failure part way leaves whatever was
    /// already materialized in place.
    pub fn export(&self, tree: &ObjectId, config: &ExportConfig) -> Result<ExportReport, ExportError> {
        config.validate()?;
        info!(
            tree = %tree.short(),
            target = %config.target.display(),
            generations = config.generations.len(),
            "starting export"
        );

        let entries = walk(self.store, *tree)?;
        prepare_target(&config.target)?;

        let mut producers: Vec<Box<dyn Producer + '_>> = Vec::with_capacity(config.generations.len() + 1);
        for generation in &config.generations {
            producers.push(Box::new(GenerationProducer::new(self.store, generation.clone())));
        }
        producers.push(Box::new(TerminalProducer::new(self.store, config.apply_modes)));

        self.run_producers(tree, entries, producers, config)
    }

    /// Run `entries` through `producers` in order, into an already prepared target.
    pub(crate) fn run_producers(
        &self,
        tree: &ObjectId,
        entries: Vec<TreeEntry>,
        mut producers: Vec<Box<dyn Producer + '_>>,
        config: &ExportConfig,
    ) -> Result<ExportReport, ExportError> {
        let target = config.target.as_path();
        let mut tracker = ProgressTracker::new(entries.len() as u64);
        let mut unresolved = entries;
        let mut passes = Vec::new();
        let mut directories = 0u64;

        for (pass, producer) in producers.iter_mut().enumerate() {
            let label = producer.label();
            if unresolved.is_empty() {
                debug!(producer = %label, "nothing left to resolve, skipping");
                continue;
            }

            tracker.start_pass(pass, label.clone());
            let mut stats = PassStats {
                label,
                attempted: 0,
                resolved: 0,
            };
            let mut remaining = Vec::new();

            for entry in unresolved {
                tracker.set_current_path(&entry.path);

                let is_dir = entry.is_dir();
                let resolved = if is_dir {
                    create_dir(&entry.path.to_path(target))?;
                    directories += 1;
                    tracker.record_dir();
                    true
                } else {
                    stats.attempted += 1;
                    match producer.try_resolve(&entry, target)? {
                        Resolution::Linked { .. } => {
                            tracker.record_link();
                            true
                        }
                        Resolution::Written { bytes } => {
                            tracker.record_write(bytes);
                            true
                        }
                        Resolution::Unresolved => {
                            remaining.push(entry);
                            false
                        }
                    }
                };

                if !resolved {
                    continue;
                }
                if !is_dir {
                    stats.resolved += 1;
                }
                if config.progress_interval > 0
                    && tracker.entries_done() % config.progress_interval == 0
                {
                    let _ = self.progress_tx.send(tracker.snapshot());
                }
            }

            debug!(
                producer = %stats.label,
                attempted = stats.attempted,
                resolved = stats.resolved,
                remaining = remaining.len(),
                "pass finished"
            );
            passes.push(stats);
            unresolved = remaining;
        }

        let _ = self.progress_tx.send(tracker.snapshot());

        if !unresolved.is_empty() {
            return Err(ExportError::UnresolvedEntries {
                entries: unresolved,
            });
        }

        let progress = tracker.snapshot();
        let report = ExportReport {
            tree: *tree,
            target: config.target.clone(),
            directories,
            files_linked: progress.linked,
            files_written: progress.written,
            bytes_written: progress.bytes_written,
            passes,
            duration: tracker.elapsed(),
            exported_at: Utc::now(),
        };
        info!(
            directories = report.directories,
            linked = report.files_linked,
            written = report.files_written,
            bytes = report.bytes_written,
            "export finished"
        );
        Ok(report)
    }
}

/// Make sure `target` is an empty directory, creating it if absent.
pub fn prepare_target(target: &Path) -> Result<(), ExportError> {
    match fs::metadata(target) {
        Ok(metadata) if metadata.is_dir() => {
            let mut children = fs::read_dir(target).map_err(|err| ExportError::io(target, err))?;
            if children.next().is_some() {
                return Err(ExportError::TargetNotEmpty {
                    path: target.to_path_buf(),
                });
            }
            Ok(())
        }
        Ok(_) => Err(ExportError::TargetNotADirectory {
            path: target.to_path_buf(),
        }),
        Err(err) if err.kind() == IoErrorKind::NotFound => {
            fs::create_dir(target).map_err(|err| target_error(target, err))
        }
        Err(err) => Err(ExportError::io(target, err)),
    }
}

fn create_dir(path: &Path) -> Result<(), ExportError> {
    match fs::create_dir(path) {
        Ok(()) => {
            trace!(path = %path.display(), "created directory");
            Ok(())
        }
        Err(err) if err.kind() == IoErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(err) => Err(target_error(path, err)),
    }
}
