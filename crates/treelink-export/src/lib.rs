//! Generational hardlink export engine for treelink.
//!
//! Exports a stored tree into a fresh directory. Files whose content and
//! mode already exist in an earlier export ("generation") are hardlinked
//! from there instead of being written again.
//!
//! # Overview
//!
//! - [`TreeWalker`] lists a tree depth-first, parents before children
//! - [`IdentityIndex`] maps `(mode, content id)` to a path within a tree
//! - [`Producer`]s materialize entries: one [`GenerationProducer`] per
//!   generation, newest first, then the store-backed [`TerminalProducer`]
//! - [`Exporter`] prepares the target and runs the producer passes
//!
//! # Example
//!
//! ```rust,no_run
//! use treelink_core::{ExportConfig, GenerationDescriptor};
//! use treelink_export::Exporter;
//! use treelink_store::{GitStore, resolve_treeish};
//!
//! let store = GitStore::discover(".").unwrap();
//! let tree = resolve_treeish(&store, "v42").unwrap();
//! let previous = resolve_treeish(&store, "v41").unwrap();
//!
//! let config = ExportConfig::new("/srv/www/release-42")
//!     .with_generation(GenerationDescriptor::new(previous, "/srv/www/release-41"));
//! let report = Exporter::new(&store).export(&tree, &config).unwrap();
//!
//! println!("{} linked, {} written", report.files_linked, report.files_written);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use treelink_core::{ExportConfig, ObjectId};
//! use treelink_export::Exporter;
//! use treelink_store::GitStore;
//!
//! let store = GitStore::discover(".").unwrap();
//! let exporter = Exporter::new(&store);
//! let mut progress_rx = exporter.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(progress) = progress_rx.blocking_recv() {
//!         eprintln!("{}/{} entries", progress.entries_done, progress.entries_total);
//!     }
//! });
//! # let tree = ObjectId::new([0; 20]);
//! exporter.export(&tree, &ExportConfig::new("out")).unwrap();
//! ```

mod engine;
mod index;
mod producer;
mod progress;
mod report;
#[cfg(test)]
mod testing;
mod walker;

pub use engine::{Exporter, prepare_target};
pub use index::IdentityIndex;
pub use producer::{GenerationProducer, Producer, Resolution, TerminalProducer};
pub use progress::ExportProgress;
pub use report::{ExportReport, PassStats};
pub use walker::{TreeWalker, walk};

// Re-export core types for convenience
pub use treelink_core::{
    ExportConfig, ExportError, FileKind, GenerationDescriptor, IdentityKey, ObjectId, TreeEntry,
};
