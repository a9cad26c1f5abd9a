//! End-to-end exports from a real git repository.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use treelink_core::{ErrorKind, ExportConfig, GenerationDescriptor, MODE_BLOB, MODE_TREE};
use treelink_export::Exporter;
use treelink_store::{GitStore, resolve_treeish};

struct Fixture {
    temp: TempDir,
    store: GitStore,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init_bare(temp.path().join("repo.git")).unwrap();
        Self {
            temp,
            store: GitStore::from_repository(repo),
        }
    }

    fn repo(&self) -> &Repository {
        self.store.repository()
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.temp.path().join(name)
    }

    /// Build a tree from `(path, content)` pairs; `/` in a path nests directories.
    fn tree(&self, files: &[(&str, &str)]) -> Oid {
        let repo = self.repo();
        let mut root = repo.treebuilder(None).unwrap();
        let mut dirs: Vec<(&str, Vec<(&str, &str)>)> = Vec::new();

        for &(path, content) in files {
            match path.split_once('/') {
                Some((dir, rest)) => match dirs.iter_mut().find(|(name, _)| *name == dir) {
                    Some((_, children)) => children.push((rest, content)),
                    None => dirs.push((dir, vec![(rest, content)])),
                },
                None => {
                    let blob = repo.blob(content.as_bytes()).unwrap();
                    root.insert(path, blob, MODE_BLOB as i32).unwrap();
                }
            }
        }
        for (dir, children) in dirs {
            let sub = self.tree(&children);
            root.insert(dir, sub, MODE_TREE as i32).unwrap();
        }
        root.write().unwrap()
    }

    /// Commit `tree` onto `refs/heads/main` and return the commit id.
    fn commit(&self, tree: Oid, message: &str) -> Oid {
        let repo = self.repo();
        let sig = Signature::now("Test", "test@test.com").unwrap();
        let tree = repo.find_tree(tree).unwrap();
        let parent = repo
            .refname_to_id("refs/heads/main")
            .ok()
            .map(|id| repo.find_commit(id).unwrap());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("refs/heads/main"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }
}

/// Every path under `root`, relative and slash-separated, directories included.
fn list_tree(root: &Path) -> BTreeSet<String> {
    fn visit(dir: &Path, prefix: &str, out: &mut BTreeSet<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if entry.file_type().unwrap().is_dir() {
                visit(&entry.path(), &path, out);
            }
            out.insert(path);
        }
    }

    let mut out = BTreeSet::new();
    visit(root, "", &mut out);
    out
}

#[cfg(unix)]
fn inode(path: &Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).unwrap().ino()
}

#[test]
fn test_export_head_files() {
    let fixture = Fixture::new();
    let tree = fixture.tree(&[("a", "a"), ("dir/a", "a"), ("dir/b", "b")]);
    let commit = fixture.commit(tree, "initial");

    let head = resolve_treeish(&fixture.store, "main").unwrap();
    assert_eq!(head.to_hex(), tree.to_string());
    assert_eq!(
        resolve_treeish(&fixture.store, &commit.to_string()).unwrap(),
        head
    );

    let target = fixture.path("out");
    let report = Exporter::new(&fixture.store)
        .export(&head, &ExportConfig::new(&target))
        .unwrap();

    assert_eq!(fs::read_to_string(target.join("a")).unwrap(), "a");
    assert_eq!(fs::read_to_string(target.join("dir/a")).unwrap(), "a");
    assert_eq!(fs::read_to_string(target.join("dir/b")).unwrap(), "b");
    assert_eq!(report.directories, 1);
    assert_eq!(report.files_written, 3);
    assert_eq!(report.files_linked, 0);
}

#[cfg(unix)]
#[test]
fn test_equal_files_share_inode_through_parent_generation() {
    let fixture = Fixture::new();
    let parent_tree = fixture.tree(&[("a", "a"), ("c", "c")]);
    fixture.commit(parent_tree, "parent");
    let head_tree = fixture.tree(&[("a", "a"), ("dir/a", "a"), ("dir/b", "b")]);
    fixture.commit(head_tree, "head");

    let store = &fixture.store;
    let parent = resolve_treeish(store, &parent_tree.to_string()).unwrap();
    let head = resolve_treeish(store, "main").unwrap();

    let parent_dir = fixture.path("parent");
    Exporter::new(store)
        .export(&parent, &ExportConfig::new(&parent_dir))
        .unwrap();

    let head_dir = fixture.path("head");
    let config = ExportConfig::new(&head_dir)
        .with_generation(GenerationDescriptor::new(parent, &parent_dir));
    let report = Exporter::new(store).export(&head, &config).unwrap();

    let shared = inode(&parent_dir.join("a"));
    assert_eq!(inode(&head_dir.join("a")), shared);
    assert_eq!(inode(&head_dir.join("dir/a")), shared);
    assert_ne!(inode(&head_dir.join("dir/b")), shared);

    assert_eq!(report.files_linked, 2);
    assert_eq!(report.files_written, 1);
    assert_eq!(report.passes.len(), 2);
    assert_eq!(report.passes[0].resolved, 2);
}

#[cfg(unix)]
#[test]
fn test_chain_of_generations() {
    let fixture = Fixture::new();
    let store = &fixture.store;
    let one = fixture.tree(&[("a", "1")]);
    let two = fixture.tree(&[("a", "2"), ("b", "1")]);
    let three = fixture.tree(&[("a", "1"), ("b", "2"), ("c", "3")]);
    let [one, two, three] = [one, two, three].map(|oid| {
        resolve_treeish(store, &oid.to_string()).unwrap()
    });

    let exporter = Exporter::new(store);
    exporter
        .export(&one, &ExportConfig::new(fixture.path("1")))
        .unwrap();
    exporter
        .export(
            &two,
            &ExportConfig::new(fixture.path("2"))
                .with_generation(GenerationDescriptor::new(one, fixture.path("1"))),
        )
        .unwrap();
    let report = exporter
        .export(
            &three,
            &ExportConfig::new(fixture.path("3"))
                .with_generation(GenerationDescriptor::new(two, fixture.path("2")))
                .with_generation(GenerationDescriptor::new(one, fixture.path("1"))),
        )
        .unwrap();

    // "1" lives in both older generations; the newest one wins
    assert_eq!(inode(&fixture.path("3/a")), inode(&fixture.path("2/b")));
    assert_eq!(inode(&fixture.path("3/b")), inode(&fixture.path("2/a")));
    assert_eq!(fs::read_to_string(fixture.path("3/c")).unwrap(), "3");
    assert_eq!(report.files_linked, 2);
    assert_eq!(report.files_written, 1);
}

#[test]
fn test_non_empty_target_is_rejected() {
    let fixture = Fixture::new();
    let tree = fixture.tree(&[("a", "a")]);
    fixture.commit(tree, "initial");
    let head = resolve_treeish(&fixture.store, "main").unwrap();

    let target = fixture.path("out");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep"), "mine").unwrap();

    let err = Exporter::new(&fixture.store)
        .export(&head, &ExportConfig::new(&target))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TargetNotEmpty);
    assert!(err.to_string().starts_with("Not empty"));
    assert!(!target.join("a").exists());
    assert_eq!(fs::read_to_string(target.join("keep")).unwrap(), "mine");
}

#[test]
fn test_deleted_generation_fails_loudly() {
    let fixture = Fixture::new();
    let tree = fixture.tree(&[("a", "a")]);
    let id = resolve_treeish(&fixture.store, &tree.to_string()).unwrap();

    let config = ExportConfig::new(fixture.path("new"))
        .with_generation(GenerationDescriptor::new(id, fixture.path("gone")));
    let err = Exporter::new(&fixture.store).export(&id, &config).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LinkSourceMissing);
    assert!(fixture.path("new").is_dir());
}

#[test]
fn test_export_creates_no_extra_files() {
    let fixture = Fixture::new();
    let tree = fixture.tree(&[
        ("a", "a"),
        ("dir/a", "a"),
        ("dir/b", "b"),
        ("dir/sub/deep/c", "c"),
    ]);
    let id = resolve_treeish(&fixture.store, &tree.to_string()).unwrap();
    let expected: BTreeSet<String> = [
        "a",
        "dir",
        "dir/a",
        "dir/b",
        "dir/sub",
        "dir/sub/deep",
        "dir/sub/deep/c",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let exporter = Exporter::new(&fixture.store);
    let first = fixture.path("first");
    exporter.export(&id, &ExportConfig::new(&first)).unwrap();
    assert_eq!(list_tree(&first), expected);
    assert_eq!(fs::read_to_string(first.join("dir/sub/deep/c")).unwrap(), "c");

    let linked = fixture.path("linked");
    let config =
        ExportConfig::new(&linked).with_generation(GenerationDescriptor::new(id, &first));
    let report = exporter.export(&id, &config).unwrap();
    assert_eq!(list_tree(&linked), expected);
    assert_eq!(report.files_linked, 4);
    assert_eq!(report.directories, 3);
}

#[test]
fn test_directory_structure_is_identical_across_targets() {
    let fixture = Fixture::new();
    let tree = fixture.tree(&[
        ("top", "t"),
        ("x/y/z/leaf", "l"),
        ("x/y/other", "o"),
        ("x/side", "s"),
    ]);
    let id = resolve_treeish(&fixture.store, &tree.to_string()).unwrap();

    let exporter = Exporter::new(&fixture.store);
    let one = fixture.path("one");
    let two = fixture.path("two");
    exporter.export(&id, &ExportConfig::new(&one)).unwrap();
    exporter.export(&id, &ExportConfig::new(&two)).unwrap();

    let layout = list_tree(&one);
    assert_eq!(layout, list_tree(&two));
    assert!(layout.contains("x/y/z"));
    for path in &layout {
        assert_eq!(one.join(path).is_dir(), two.join(path).is_dir(), "{path}");
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_exported() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = Fixture::new();
    let repo = fixture.repo();
    let blob = repo.blob(b"menu").unwrap();
    let name = OsStr::from_bytes(b"caf\xe9.txt");
    let dir_name = OsStr::from_bytes(b"r\xe9sum\xe9");

    let mut sub = repo.treebuilder(None).unwrap();
    sub.insert(name, blob, MODE_BLOB as i32).unwrap();
    let sub = sub.write().unwrap();
    let mut root = repo.treebuilder(None).unwrap();
    root.insert(name, blob, MODE_BLOB as i32).unwrap();
    root.insert(dir_name, sub, MODE_TREE as i32).unwrap();
    let tree = root.write().unwrap();

    let store = &fixture.store;
    let id = resolve_treeish(store, &tree.to_string()).unwrap();
    let first = fixture.path("first");
    let report = Exporter::new(store)
        .export(&id, &ExportConfig::new(&first))
        .unwrap();

    assert_eq!(report.files_written, 2);
    assert_eq!(fs::read(first.join(name)).unwrap(), b"menu");
    assert_eq!(fs::read(first.join(dir_name).join(name)).unwrap(), b"menu");

    let second = fixture.path("second");
    let config =
        ExportConfig::new(&second).with_generation(GenerationDescriptor::new(id, &first));
    let report = Exporter::new(store).export(&id, &config).unwrap();

    assert_eq!(report.files_linked, 2);
    assert_eq!(
        inode(&second.join(name)),
        inode(&second.join(dir_name).join(name))
    );
}
