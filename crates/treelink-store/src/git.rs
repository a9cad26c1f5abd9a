//! Content store backed by a git object database.

use std::path::Path;

use git2::{ErrorCode, ObjectType, Oid, Reference, Repository};
use tracing::trace;

use treelink_core::{
    ChildEntry, ContentStore, ObjectId, ObjectLookup, StoreError, StoredObject,
};

/// Reads trees, blobs and references from a git repository.
pub struct GitStore {
    repo: Repository,
}

impl GitStore {
    /// Open the repository at exactly `path` (work tree or bare).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let repo = Repository::open(path.as_ref()).map_err(StoreError::backend)?;
        Ok(Self { repo })
    }

    /// Find a repository at `path` or any of its parents.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let repo = Repository::discover(path.as_ref()).map_err(StoreError::backend)?;
        Ok(Self { repo })
    }

    /// Wrap an already opened repository.
    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn find(&self, id: &ObjectId) -> Result<git2::Object<'_>, StoreError> {
        self.repo
            .find_object(to_oid(id)?, None)
            .map_err(|err| lookup_error(id, err))
    }
}

impl ContentStore for GitStore {
    fn list_children(&self, tree: &ObjectId) -> Result<Vec<ChildEntry>, StoreError> {
        let object = self.find(tree)?;
        let found = type_name(object.kind());
        let tree_obj = object.into_tree().map_err(|_| StoreError::UnexpectedKind {
            id: *tree,
            expected: "tree",
            found,
        })?;

        let mut children = Vec::with_capacity(tree_obj.len());
        for entry in tree_obj.iter() {
            children.push(ChildEntry::new(
                entry.name_bytes(),
                entry.filemode() as u32,
                from_oid(entry.id())?,
            ));
        }
        trace!(tree = %tree.short(), children = children.len(), "listed tree");
        Ok(children)
    }

    fn read_content(&self, blob: &ObjectId) -> Result<Vec<u8>, StoreError> {
        let object = self.find(blob)?;
        let found = type_name(object.kind());
        let blob_obj = object.into_blob().map_err(|_| StoreError::UnexpectedKind {
            id: *blob,
            expected: "blob",
            found,
        })?;
        Ok(blob_obj.content().to_vec())
    }
}

impl ObjectLookup for GitStore {
    fn resolve_reference(&self, name: &str) -> Result<Option<ObjectId>, StoreError> {
        if !Reference::is_valid_name(name) {
            return Ok(None);
        }
        match self.repo.refname_to_id(name) {
            Ok(oid) => from_oid(oid).map(Some),
            Err(err) if matches!(err.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => Ok(None),
            Err(err) => Err(StoreError::backend(err)),
        }
    }

    fn get_object(&self, id: &ObjectId) -> Result<StoredObject, StoreError> {
        let object = self.find(id)?;
        match object.kind() {
            Some(ObjectType::Tree) => Ok(StoredObject::Tree),
            Some(ObjectType::Blob) => Ok(StoredObject::Blob),
            Some(ObjectType::Tag) => {
                let tag = object.as_tag().ok_or_else(|| StoreError::UnexpectedKind {
                    id: *id,
                    expected: "tag",
                    found: type_name(object.kind()),
                })?;
                Ok(StoredObject::Tag {
                    target: from_oid(tag.target_id())?,
                })
            }
            Some(ObjectType::Commit) => {
                let commit = object.as_commit().ok_or_else(|| StoreError::UnexpectedKind {
                    id: *id,
                    expected: "commit",
                    found: type_name(object.kind()),
                })?;
                Ok(StoredObject::Commit {
                    tree: from_oid(commit.tree_id())?,
                })
            }
            other => Err(StoreError::UnexpectedKind {
                id: *id,
                expected: "tree, blob, tag or commit",
                found: type_name(other),
            }),
        }
    }
}

fn to_oid(id: &ObjectId) -> Result<Oid, StoreError> {
    Oid::from_bytes(id.as_bytes()).map_err(StoreError::backend)
}

fn from_oid(oid: Oid) -> Result<ObjectId, StoreError> {
    ObjectId::from_bytes(oid.as_bytes()).ok_or_else(|| StoreError::Backend {
        message: format!("unsupported object id length: {oid}"),
    })
}

fn lookup_error(id: &ObjectId, err: git2::Error) -> StoreError {
    if err.code() == ErrorCode::NotFound {
        StoreError::ObjectNotFound { id: *id }
    } else {
        StoreError::backend(err)
    }
}

fn type_name(kind: Option<ObjectType>) -> &'static str {
    kind.map(|k| k.str()).unwrap_or("unknown")
}
