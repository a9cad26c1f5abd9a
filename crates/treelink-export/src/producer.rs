//! Producers materialize file and symlink entries under the target root.
//!
//! The export engine tries producers in order: one per previous
//! generation (hardlinking from that export), then the store itself.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::trace;

use treelink_core::{ContentStore, ExportError, FileKind, GenerationDescriptor, TreeEntry};

use crate::index::IdentityIndex;

/// Outcome of asking a producer for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Hardlinked from an existing file.
    Linked { source: PathBuf },
    /// Written fresh with this many content bytes.
    Written { bytes: u64 },
    /// This producer cannot supply the entry.
    Unresolved,
}

impl Resolution {
    /// Check if the entry now exists on disk.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// A source of file content for export entries.
pub trait Producer {
    /// Short human-readable name for logs and reports.
    fn label(&self) -> String;

    /// Materialize `entry` under `target_root`, or report that it cannot.
    ///
    /// Errors abort the whole export; `Ok(Resolution::Unresolved)` passes
    /// the entry on to the next producer.
    fn try_resolve(&mut self, entry: &TreeEntry, target_root: &Path) -> Result<Resolution, ExportError>;
}

/// Hardlinks entries from one previous export.
///
/// The generation's identity index is built on the first lookup, so a
/// generation that is never consulted costs nothing.
pub struct GenerationProducer<'s, S: ContentStore + ?Sized> {
    store: &'s S,
    generation: GenerationDescriptor,
    index: Option<IdentityIndex>,
}

impl<'s, S: ContentStore + ?Sized> GenerationProducer<'s, S> {
    /// Create a producer for `generation`.
    pub fn new(store: &'s S, generation: GenerationDescriptor) -> Self {
        Self {
            store,
            generation,
            index: None,
        }
    }

    /// Check if the index has been built yet.
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    fn index(&mut self) -> Result<&IdentityIndex, ExportError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => IdentityIndex::build(self.store, &self.generation.tree)?,
        };
        Ok(self.index.insert(index))
    }
}

impl<S: ContentStore + ?Sized> Producer for GenerationProducer<'_, S> {
    fn label(&self) -> String {
        format!("generation {}", self.generation)
    }

    fn try_resolve(&mut self, entry: &TreeEntry, target_root: &Path) -> Result<Resolution, ExportError> {
        let Some(key) = entry.identity_key() else {
            return Ok(Resolution::Unresolved);
        };
        let Some(found) = self.index()?.get(&key).cloned() else {
            return Ok(Resolution::Unresolved);
        };

        let source = found.to_path(&self.generation.path);
        let target = entry.path.to_path(target_root);
        link_file(&source, &target)?;
        trace!(path = %entry.path, source = %source.display(), "linked");

        Ok(Resolution::Linked { source })
    }
}

/// Writes entries with content read from the store. Never leaves an entry
/// unresolved.
pub struct TerminalProducer<'s, S: ContentStore + ?Sized> {
    store: &'s S,
    apply_modes: bool,
}

impl<'s, S: ContentStore + ?Sized> TerminalProducer<'s, S> {
    /// Create the store-backed producer.
    pub fn new(store: &'s S, apply_modes: bool) -> Self {
        Self { store, apply_modes }
    }
}

impl<S: ContentStore + ?Sized> Producer for TerminalProducer<'_, S> {
    fn label(&self) -> String {
        "store".to_string()
    }

    fn try_resolve(&mut self, entry: &TreeEntry, target_root: &Path) -> Result<Resolution, ExportError> {
        let target = entry.path.to_path(target_root);
        if !parent_is_dir(&target) {
            return Err(ExportError::TargetDirectoryMissing { path: target });
        }

        let content = self.store.read_content(&entry.id)?;
        match entry.kind {
            FileKind::RegularFile => {
                let mode = self.apply_modes.then(|| file_mode(entry));
                write_file(&target, &content, mode)?;
            }
            FileKind::Symlink => write_symlink(&target, &content)?,
            // Directories are created by the engine, never produced.
            FileKind::Directory => return Ok(Resolution::Unresolved),
        }
        trace!(path = %entry.path, bytes = content.len(), "written");

        Ok(Resolution::Written {
            bytes: content.len() as u64,
        })
    }
}

/// Permission bits for a freshly written regular file.
fn file_mode(entry: &TreeEntry) -> u32 {
    if entry.is_executable() { 0o755 } else { 0o644 }
}

fn link_file(source: &Path, target: &Path) -> Result<(), ExportError> {
    fs::hard_link(source, target).map_err(|err| {
        if fs::symlink_metadata(source).is_err() {
            ExportError::LinkSourceMissing {
                link_source: source.to_path_buf(),
                target: target.to_path_buf(),
            }
        } else {
            target_error(target, err)
        }
    })
}

fn write_file(target: &Path, content: &[u8], mode: Option<u32>) -> Result<(), ExportError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|err| target_error(target, err))?;
    file.write_all(content)
        .map_err(|err| ExportError::io(target, err))?;
    if let Some(mode) = mode {
        set_mode(&file, mode).map_err(|err| ExportError::io(target, err))?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &Path, content: &[u8]) -> Result<(), ExportError> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    std::os::unix::fs::symlink(OsStr::from_bytes(content), target)
        .map_err(|err| target_error(target, err))
}

#[cfg(not(unix))]
fn write_symlink(target: &Path, content: &[u8]) -> Result<(), ExportError> {
    // No portable symlinks; keep the link target as file content.
    write_file(target, content, None)
}

/// Classify a failed create/link at `target`.
pub(crate) fn target_error(target: &Path, err: std::io::Error) -> ExportError {
    if parent_is_dir(target) {
        ExportError::io(target, err)
    } else {
        ExportError::TargetDirectoryMissing {
            path: target.to_path_buf(),
        }
    }
}

fn parent_is_dir(path: &Path) -> bool {
    path.parent().is_some_and(Path::is_dir)
}
