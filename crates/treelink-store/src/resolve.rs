//! Treeish resolution: references, tags and commits down to a tree.

use tracing::debug;

use treelink_core::{ExportError, ObjectId, ObjectLookup, StoreError, StoredObject};

/// Upper bound on tag/commit hops before giving up.
pub const MAX_PEEL_DEPTH: usize = 32;

/// Resolve a reference name, tag, commit or tree id to a tree id.
///
/// Reference names are tried first, spelled the way git expands short
/// names (`main` finds `refs/heads/main`, `v1` finds `refs/tags/v1`).
/// Only if no reference matches is the input taken as a full hex id.
pub fn resolve_treeish<L>(lookup: &L, treeish: &str) -> Result<ObjectId, ExportError>
where
    L: ObjectLookup + ?Sized,
{
    let start = match find_reference(lookup, treeish)? {
        Some(id) => id,
        None => ObjectId::from_hex(treeish).ok_or_else(|| {
            ExportError::resolution(treeish, "not a reference or full object id")
        })?,
    };

    let tree = peel_to_tree(lookup, treeish, start)?;
    debug!(treeish, tree = %tree.short(), "resolved treeish");
    Ok(tree)
}

/// Follow tag targets and commit trees from `start` until a tree is reached.
pub fn peel_to_tree<L>(lookup: &L, treeish: &str, start: ObjectId) -> Result<ObjectId, ExportError>
where
    L: ObjectLookup + ?Sized,
{
    let mut current = start;
    for _ in 0..MAX_PEEL_DEPTH {
        let object = lookup.get_object(&current).map_err(|err| match err {
            StoreError::ObjectNotFound { id } => {
                ExportError::resolution(treeish, format!("object {id} not found"))
            }
            other => ExportError::resolution(treeish, other.to_string()),
        })?;

        current = match object {
            StoredObject::Tree => return Ok(current),
            StoredObject::Tag { target } => target,
            StoredObject::Commit { tree } => tree,
            StoredObject::Blob => {
                return Err(ExportError::resolution(
                    treeish,
                    format!("{current} is a blob, not a tree"),
                ));
            }
        };
    }

    Err(ExportError::resolution(
        treeish,
        format!("more than {MAX_PEEL_DEPTH} tag or commit hops"),
    ))
}

fn find_reference<L>(lookup: &L, name: &str) -> Result<Option<ObjectId>, ExportError>
where
    L: ObjectLookup + ?Sized,
{
    if name.is_empty() {
        return Ok(None);
    }
    for candidate in reference_candidates(name) {
        let found = lookup
            .resolve_reference(&candidate)
            .map_err(|err| ExportError::resolution(name, err.to_string()))?;
        if let Some(id) = found {
            debug!(name, reference = %candidate, "matched reference");
            return Ok(Some(id));
        }
    }
    Ok(None)
}

fn reference_candidates(name: &str) -> [String; 6] {
    [
        name.to_string(),
        format!("refs/{name}"),
        format!("refs/tags/{name}"),
        format!("refs/heads/{name}"),
        format!("refs/remotes/{name}"),
        format!("refs/remotes/{name}/HEAD"),
    ]
}
