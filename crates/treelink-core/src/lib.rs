//! Core types and traits for treelink.
//!
//! This crate provides the data model shared by the store adapter and the
//! export engine: object identities, tree entries, generation descriptors,
//! the store contracts, errors and configuration.

mod config;
mod error;
mod object;
mod store;

pub use config::{ExportConfig, ExportConfigBuilder, ExportConfigBuilderError};
pub use error::{ErrorKind, ExportError, PathError, StoreError};
pub use object::{
    ChildEntry, FileKind, GenerationDescriptor, IdentityKey, MODE_BLOB, MODE_BLOB_EXECUTABLE,
    MODE_COMMIT, MODE_LINK, MODE_TREE, ObjectId, RelativePath, TreeEntry,
};
pub use store::{ContentStore, ObjectLookup, StoredObject};
