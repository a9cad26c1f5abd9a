//! Depth-first traversal of a stored tree.

use std::vec;

use tracing::trace;

use treelink_core::{ChildEntry, ContentStore, ObjectId, RelativePath, StoreError, TreeEntry};

/// Lazy pre-order walk over every exportable entry of a tree.
///
/// A directory is yielded before any of its descendants. Entries without a
/// [`FileKind`](treelink_core::FileKind) (nested repository references) are
/// dropped. The first store error is yielded once and ends the walk.
pub struct TreeWalker<'s, S: ContentStore + ?Sized> {
    store: &'s S,
    root: Option<ObjectId>,
    stack: Vec<(Option<RelativePath>, vec::IntoIter<ChildEntry>)>,
    failed: bool,
}

impl<'s, S: ContentStore + ?Sized> TreeWalker<'s, S> {
    /// Create a walker over `tree`. Nothing is read until the first `next`.
    pub fn new(store: &'s S, tree: ObjectId) -> Self {
        Self {
            store,
            root: Some(tree),
            stack: Vec::new(),
            failed: false,
        }
    }

    fn fail(&mut self, err: StoreError) -> Option<Result<TreeEntry, StoreError>> {
        self.failed = true;
        self.stack.clear();
        Some(Err(err))
    }
}

impl<S: ContentStore + ?Sized> Iterator for TreeWalker<'_, S> {
    type Item = Result<TreeEntry, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(root) = self.root.take() {
            match self.store.list_children(&root) {
                Ok(children) => self.stack.push((None, children.into_iter())),
                Err(err) => return self.fail(err),
            }
        }

        loop {
            let (parent, children) = self.stack.last_mut()?;
            let Some(child) = children.next() else {
                self.stack.pop();
                continue;
            };

            let Some(kind) = child.kind() else {
                let name = String::from_utf8_lossy(&child.name);
                trace!(%name, mode = format_args!("{:06o}", child.mode), "skipping entry");
                continue;
            };

            let path = match parent {
                Some(parent) => parent.join(&child.name),
                None => RelativePath::from_name(&child.name),
            };
            let path = match path {
                Ok(path) => path,
                Err(err) => return self.fail(err.into()),
            };

            if kind.is_dir() {
                match self.store.list_children(&child.id) {
                    Ok(grandchildren) => {
                        self.stack.push((Some(path.clone()), grandchildren.into_iter()))
                    }
                    Err(err) => return self.fail(err),
                }
            }

            return Some(Ok(TreeEntry::new(path, kind, child.mode, child.id)));
        }
    }
}

/// Collect every entry of `tree` in traversal order.
pub fn walk<S: ContentStore + ?Sized>(store: &S, tree: ObjectId) -> Result<Vec<TreeEntry>, StoreError> {
    TreeWalker::new(store, tree).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use treelink_core::{FileKind, MODE_BLOB, MODE_COMMIT, MODE_LINK, MODE_TREE};

    fn paths(entries: &[TreeEntry]) -> Vec<String> {
        entries.iter().map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn test_parents_before_children() {
        let mut store = MemoryStore::default();
        let x = store.blob(b"x");
        let deep = store.tree(vec![("f", MODE_BLOB, x)]);
        let sub = store.tree(vec![("deep", MODE_TREE, deep), ("g", MODE_BLOB, x)]);
        let root = store.tree(vec![("a", MODE_BLOB, x), ("sub", MODE_TREE, sub), ("z", MODE_BLOB, x)]);

        let entries = walk(&store, root).unwrap();
        assert_eq!(
            paths(&entries),
            vec!["a", "sub", "sub/deep", "sub/deep/f", "sub/g", "z"]
        );
        assert_eq!(entries[1].kind, FileKind::Directory);
    }

    #[test]
    fn test_gitlinks_are_dropped() {
        let mut store = MemoryStore::default();
        let x = store.blob(b"x");
        let link = store.blob(b"a");
        let root = store.tree(vec![
            ("a", MODE_BLOB, x),
            ("current", MODE_LINK, link),
            ("vendor", MODE_COMMIT, ObjectId::new([0xee; 20])),
        ]);

        let entries = walk(&store, root).unwrap();
        assert_eq!(paths(&entries), vec!["a", "current"]);
        assert_eq!(entries[1].kind, FileKind::Symlink);
    }

    #[test]
    fn test_lazy_until_first_next() {
        let mut store = MemoryStore::default();
        let x = store.blob(b"x");
        let root = store.tree(vec![("a", MODE_BLOB, x)]);

        let mut walker = TreeWalker::new(&store, root);
        assert_eq!(store.listings(), 0);
        assert!(walker.next().is_some());
        assert_eq!(store.listings(), 1);
    }

    #[test]
    fn test_missing_subtree_ends_walk() {
        let mut store = MemoryStore::default();
        let x = store.blob(b"x");
        let root = store.tree(vec![
            ("broken", MODE_TREE, ObjectId::new([0xaa; 20])),
            ("z", MODE_BLOB, x),
        ]);

        let mut walker = TreeWalker::new(&store, root);
        assert!(matches!(
            walker.next(),
            Some(Err(StoreError::ObjectNotFound { .. }))
        ));
        assert!(walker.next().is_none());
        assert!(walk(&store, root).is_err());
    }
}
