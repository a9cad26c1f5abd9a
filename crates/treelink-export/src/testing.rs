//! In-memory content store for unit tests.

use std::cell::Cell;
use std::collections::HashMap;

use treelink_core::{ChildEntry, ContentStore, ObjectId, StoreError};

#[derive(Default)]
pub(crate) struct MemoryStore {
    trees: HashMap<ObjectId, Vec<ChildEntry>>,
    blobs: HashMap<ObjectId, Vec<u8>>,
    next_id: u32,
    listings: Cell<usize>,
    reads: Cell<usize>,
}

impl MemoryStore {
    /// Store a blob. Equal content always gets the same id.
    pub fn blob(&mut self, content: &[u8]) -> ObjectId {
        if let Some((id, _)) = self.blobs.iter().find(|(_, c)| c.as_slice() == content) {
            return *id;
        }
        let id = self.fresh_id();
        self.blobs.insert(id, content.to_vec());
        id
    }

    pub fn tree(&mut self, children: Vec<(&str, u32, ObjectId)>) -> ObjectId {
        let id = self.fresh_id();
        let children = children
            .into_iter()
            .map(|(name, mode, child)| ChildEntry::new(name, mode, child))
            .collect();
        self.trees.insert(id, children);
        id
    }

    pub fn listings(&self) -> usize {
        self.listings.get()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn fresh_id(&mut self) -> ObjectId {
        self.next_id += 1;
        let mut bytes = [0u8; 20];
        bytes[..4].copy_from_slice(&self.next_id.to_be_bytes());
        ObjectId::new(bytes)
    }
}

impl ContentStore for MemoryStore {
    fn list_children(&self, tree: &ObjectId) -> Result<Vec<ChildEntry>, StoreError> {
        self.listings.set(self.listings.get() + 1);
        self.trees
            .get(tree)
            .cloned()
            .ok_or(StoreError::ObjectNotFound { id: *tree })
    }

    fn read_content(&self, blob: &ObjectId) -> Result<Vec<u8>, StoreError> {
        self.reads.set(self.reads.get() + 1);
        self.blobs
            .get(blob)
            .cloned()
            .ok_or(StoreError::ObjectNotFound { id: *blob })
    }
}
