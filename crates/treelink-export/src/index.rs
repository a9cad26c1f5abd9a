//! Content identity index of a previously exported tree.

use std::collections::HashMap;

use tracing::debug;

use treelink_core::{ContentStore, IdentityKey, ObjectId, RelativePath, StoreError, TreeEntry};

use crate::walker::TreeWalker;

/// Maps `(mode, content id)` to one path holding that content in a tree.
///
/// A tree may hold the same content at several paths. Only one is kept
/// (the last one walked); any of them works as a hardlink source.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    paths: HashMap<IdentityKey, RelativePath>,
}

impl IdentityIndex {
    /// Walk `tree` and index its files and symlinks.
    pub fn build<S: ContentStore + ?Sized>(store: &S, tree: &ObjectId) -> Result<Self, StoreError> {
        let mut index = Self::default();
        for entry in TreeWalker::new(store, *tree) {
            index.insert(entry?);
        }
        debug!(tree = %tree.short(), identities = index.len(), "built identity index");
        Ok(index)
    }

    /// Record an entry. Directories are ignored.
    pub fn insert(&mut self, entry: TreeEntry) {
        if let Some(key) = entry.identity_key() {
            self.paths.insert(key, entry.path);
        }
    }

    /// Path holding content with this identity.
    pub fn get(&self, key: &IdentityKey) -> Option<&RelativePath> {
        self.paths.get(key)
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the tree holds no files or symlinks.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
