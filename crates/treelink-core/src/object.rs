//! Object identities, tree entries and generation descriptors.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::error::PathError;

/// Tree mode of a subdirectory.
pub const MODE_TREE: u32 = 0o040000;
/// Tree mode of a non-executable regular file.
pub const MODE_BLOB: u32 = 0o100644;
/// Tree mode of an executable regular file.
pub const MODE_BLOB_EXECUTABLE: u32 = 0o100755;
/// Tree mode of a symbolic link.
pub const MODE_LINK: u32 = 0o120000;
/// Tree mode of a nested repository reference (gitlink).
pub const MODE_COMMIT: u32 = 0o160000;

const MODE_TYPE_MASK: u32 = 0o170000;

/// Content-addressed identifier of a stored object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(pub [u8; 20]);

impl ObjectId {
    /// Length of an id in bytes.
    pub const LEN: usize = 20;

    /// Create an id from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create an id from a byte slice of exactly [`Self::LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(bytes).ok().map(Self)
    }

    /// Parse a full-length hex id (either case).
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != Self::LEN * 2 {
            return None;
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Get the id as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form for log output.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(7);
        hex
    }

    /// Raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl TryFrom<String> for ObjectId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("not a full object id: {value}"))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

/// Kind of entry that can be materialized from a tree.
///
/// Anything else a tree may hold (nested repository references) has no
/// `FileKind` and is dropped during traversal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Subdirectory.
    Directory,
    /// Regular file, executable or not.
    RegularFile,
    /// Symbolic link; the blob content is the link target.
    Symlink,
}

impl FileKind {
    /// Classify a tree mode. Returns `None` for kinds that are never exported.
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & MODE_TYPE_MASK {
            0o040000 => Some(Self::Directory),
            0o100000 => Some(Self::RegularFile),
            0o120000 => Some(Self::Symlink),
            _ => None,
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Check if entries of this kind carry content (files and symlinks).
    pub fn has_content(&self) -> bool {
        matches!(self, Self::RegularFile | Self::Symlink)
    }
}

/// Slash-separated path of an entry relative to the export root.
///
/// Never empty, never absolute, and never contains `.`, `..` or empty
/// components. Names are kept as raw bytes since git trees and unix
/// filesystems do not require them to be UTF-8. Serialized forms are
/// lossy for non-UTF-8 names.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(Vec<u8>);

impl RelativePath {
    /// Validate and wrap a slash-separated relative path.
    pub fn new(path: impl Into<Vec<u8>>) -> Result<Self, PathError> {
        let path = path.into();
        if path.is_empty() {
            return Err(PathError::new(path, "path is empty"));
        }
        if path.starts_with(b"/") {
            return Err(PathError::new(path, "path is absolute"));
        }
        if let Some(reason) = path.split(|&b| b == b'/').find_map(invalid_component) {
            return Err(PathError::new(path, reason));
        }
        Ok(Self(path))
    }

    /// Path of a direct child of the export root.
    pub fn from_name(name: impl AsRef<[u8]>) -> Result<Self, PathError> {
        let name = name.as_ref();
        match invalid_component(name) {
            Some(reason) => Err(PathError::new(name, reason)),
            None => Ok(Self(name.to_vec())),
        }
    }

    /// Append a single component.
    pub fn join(&self, name: impl AsRef<[u8]>) -> Result<Self, PathError> {
        let name = name.as_ref();
        let mut path = Vec::with_capacity(self.0.len() + 1 + name.len());
        path.extend_from_slice(&self.0);
        path.push(b'/');
        path.extend_from_slice(name);

        match invalid_component(name) {
            Some(reason) => Err(PathError::new(path, reason)),
            None => Ok(Self(path)),
        }
    }

    /// The raw path bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Map this path onto a filesystem root.
    #[cfg(unix)]
    pub fn to_path(&self, root: &Path) -> PathBuf {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        root.join(OsStr::from_bytes(&self.0))
    }

    /// Map this path onto a filesystem root.
    #[cfg(not(unix))]
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(String::from_utf8_lossy(&self.0).split('/'));
        path
    }
}

fn invalid_component(component: &[u8]) -> Option<&'static str> {
    if component.is_empty() {
        Some("empty path component")
    } else if component == b"." || component == b".." {
        Some("relative path component")
    } else if component.contains(&b'/') {
        Some("component contains a slash")
    } else if component.contains(&0) {
        Some("component contains a NUL byte")
    } else {
        None
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelativePath({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl TryFrom<String> for RelativePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        match String::from_utf8(path.0) {
            Ok(path) => path,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

/// One row of a directory listing as returned by a content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Entry name (a single path component), as stored.
    pub name: Vec<u8>,
    /// Tree mode: type and permission bits.
    pub mode: u32,
    /// Identity of the entry's tree or blob.
    pub id: ObjectId,
}

impl ChildEntry {
    /// Create a new listing row.
    pub fn new(name: impl Into<Vec<u8>>, mode: u32, id: ObjectId) -> Self {
        Self {
            name: name.into(),
            mode,
            id,
        }
    }

    /// Kind of the entry, if it is exportable.
    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_mode(self.mode)
    }
}

/// Lookup key for hardlink sources.
///
/// Equal keys mean byte-identical content with identical permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Tree mode.
    pub mode: u32,
    /// Blob identity.
    pub id: ObjectId,
}

impl IdentityKey {
    /// Create a new key.
    pub fn new(mode: u32, id: ObjectId) -> Self {
        Self { mode, id }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06o} {}", self.mode, self.id)
    }
}

/// A single node of a tree being exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the export root.
    pub path: RelativePath,
    /// Entry kind.
    pub kind: FileKind,
    /// Tree mode.
    pub mode: u32,
    /// Identity of the tree or blob.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Create a new entry.
    pub fn new(path: RelativePath, kind: FileKind, mode: u32, id: ObjectId) -> Self {
        Self {
            path,
            kind,
            mode,
            id,
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Identity key for files and symlinks, `None` for directories.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        self.kind
            .has_content()
            .then(|| IdentityKey::new(self.mode, self.id))
    }

    /// Check if a regular file entry carries any execute bit.
    pub fn is_executable(&self) -> bool {
        self.kind == FileKind::RegularFile && self.mode & 0o111 != 0
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {:06o} {})", self.path, self.kind, self.mode, self.id.short())
    }
}

/// A previously completed export usable as a hardlink source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationDescriptor {
    /// Tree that was exported.
    pub tree: ObjectId,
    /// Directory the tree was exported to.
    pub path: PathBuf,
}

impl GenerationDescriptor {
    /// Create a new descriptor.
    pub fn new(tree: ObjectId, path: impl Into<PathBuf>) -> Self {
        Self {
            tree,
            path: path.into(),
        }
    }
}

impl fmt::Display for GenerationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tree.short(), self.path.display())
    }
}
