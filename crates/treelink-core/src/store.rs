//! Contracts for the object store an export reads from.

use strum::IntoStaticStr;

use crate::error::StoreError;
use crate::object::{ChildEntry, ObjectId};

/// Read access to directory listings and raw content by identity.
pub trait ContentStore {
    /// List the children of a tree in stored order.
    fn list_children(&self, tree: &ObjectId) -> Result<Vec<ChildEntry>, StoreError>;

    /// Read the raw bytes of a file or symlink blob.
    fn read_content(&self, blob: &ObjectId) -> Result<Vec<u8>, StoreError>;
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn list_children(&self, tree: &ObjectId) -> Result<Vec<ChildEntry>, StoreError> {
        (**self).list_children(tree)
    }

    fn read_content(&self, blob: &ObjectId) -> Result<Vec<u8>, StoreError> {
        (**self).read_content(blob)
    }
}

/// A stored object reduced to the fields needed to reach a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum StoredObject {
    Tree,
    Blob,
    /// Annotated tag pointing at another object.
    Tag { target: ObjectId },
    /// Commit with its root tree.
    Commit { tree: ObjectId },
}

impl StoredObject {
    /// Object type name, as git spells it.
    pub fn type_name(&self) -> &'static str {
        self.into()
    }
}

/// Reference and object lookup used to resolve treeishes.
pub trait ObjectLookup {
    /// Resolve a fully spelled reference name. `Ok(None)` if it does not exist.
    fn resolve_reference(&self, name: &str) -> Result<Option<ObjectId>, StoreError>;

    /// Load an object header.
    fn get_object(&self, id: &ObjectId) -> Result<StoredObject, StoreError>;
}

impl<T: ObjectLookup + ?Sized> ObjectLookup for &T {
    fn resolve_reference(&self, name: &str) -> Result<Option<ObjectId>, StoreError> {
        (**self).resolve_reference(name)
    }

    fn get_object(&self, id: &ObjectId) -> Result<StoredObject, StoreError> {
        (**self).get_object(id)
    }
}
