//! Error types for store access and export operations.

use std::path::PathBuf;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::object::{ObjectId, TreeEntry};

/// A path that is not a valid export-relative path.
#[derive(Debug, Clone, Error)]
#[error("Invalid relative path {path:?}: {reason}")]
pub struct PathError {
    /// The offending path.
    pub path: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl PathError {
    /// Create a new path error. Non-UTF-8 bytes are replaced for display.
    pub fn new(path: impl AsRef<[u8]>, reason: &'static str) -> Self {
        Self {
            path: String::from_utf8_lossy(path.as_ref()).into_owned(),
            reason,
        }
    }
}

/// Errors reported by a content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist in the store.
    #[error("Object not found: {id}")]
    ObjectNotFound { id: ObjectId },

    /// The object exists but has another type.
    #[error("Object {id} is a {found}, expected a {expected}")]
    UnexpectedKind {
        id: ObjectId,
        expected: &'static str,
        found: &'static str,
    },

    /// A listing produced a path that cannot be exported.
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    /// Failure inside the storage backend.
    #[error("Store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Create a backend error from any displayable error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Target exists and has entries.
    #[error("Not empty: {path}")]
    TargetNotEmpty { path: PathBuf },

    /// Target exists but is not a directory.
    #[error("Target is not a directory: {path}")]
    TargetNotADirectory { path: PathBuf },

    /// A treeish could not be dereferenced to a tree.
    #[error("Could not resolve treeish {treeish}: {reason}")]
    ObjectResolution { treeish: String, reason: String },

    /// An indexed hardlink source vanished from a previous export.
    #[error("Link source does not exist: {link_source}")]
    LinkSourceMissing {
        link_source: PathBuf,
        target: PathBuf,
    },

    /// The parent directory of a link or write target is absent.
    #[error("Target dir does not exist for: {path}")]
    TargetDirectoryMissing { path: PathBuf },

    /// Entries left over after the final producer.
    #[error(
        "Some entries could not be exported: {}",
        .entries.iter().map(|entry| &entry.path).join(", ")
    )]
    UnresolvedEntries { entries: Vec<TreeEntry> },

    /// Reading from the content store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless classification of [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TargetNotEmpty,
    TargetNotADirectory,
    ObjectResolution,
    LinkSourceMissing,
    TargetDirectoryMissing,
    UnresolvedEntries,
    Store,
    InvalidConfig,
    Io,
}

impl ExportError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a resolution failure for a treeish.
    pub fn resolution(treeish: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ObjectResolution {
            treeish: treeish.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TargetNotEmpty { .. } => ErrorKind::TargetNotEmpty,
            Self::TargetNotADirectory { .. } => ErrorKind::TargetNotADirectory,
            Self::ObjectResolution { .. } => ErrorKind::ObjectResolution,
            Self::LinkSourceMissing { .. } => ErrorKind::LinkSourceMissing,
            Self::TargetDirectoryMissing { .. } => ErrorKind::TargetDirectoryMissing,
            Self::UnresolvedEntries { .. } => ErrorKind::UnresolvedEntries,
            Self::Store(_) => ErrorKind::Store,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Entries affected by this error, if it names any.
    pub fn entries(&self) -> &[TreeEntry] {
        match self {
            Self::UnresolvedEntries { entries } => entries,
            _ => &[],
        }
    }
}
