//! Object store access for treelink.
//!
//! Provides [`GitStore`], a [`ContentStore`] and [`ObjectLookup`] over a
//! git repository, and [`resolve_treeish`], which turns a reference name,
//! tag, commit or tree id into the tree id an export works from.
//!
//! ```rust,no_run
//! use treelink_store::{GitStore, resolve_treeish};
//!
//! let store = GitStore::discover(".").unwrap();
//! let tree = resolve_treeish(&store, "HEAD").unwrap();
//! println!("exporting tree {tree}");
//! ```

#[cfg(feature = "git")]
mod git;
mod resolve;

#[cfg(feature = "git")]
pub use git::GitStore;
pub use resolve::{MAX_PEEL_DEPTH, peel_to_tree, resolve_treeish};

// Re-export core types for convenience
pub use treelink_core::{ContentStore, ObjectId, ObjectLookup, StoreError, StoredObject};
