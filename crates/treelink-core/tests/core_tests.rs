use std::path::{Path, PathBuf};

use treelink_core::{
    ChildEntry, ErrorKind, ExportConfig, ExportError, FileKind, GenerationDescriptor,
    IdentityKey, MODE_BLOB, MODE_BLOB_EXECUTABLE, MODE_COMMIT, MODE_LINK, MODE_TREE, ObjectId,
    RelativePath, TreeEntry,
};

fn entry(path: &str, mode: u32, byte: u8) -> TreeEntry {
    TreeEntry::new(
        RelativePath::new(path).unwrap(),
        FileKind::from_mode(mode).unwrap(),
        mode,
        ObjectId::new([byte; 20]),
    )
}

#[test]
fn test_object_id_round_trips_through_json() {
    let id = ObjectId::from_hex("53c7060628b9bb17553dbbdefa9c875437ff0396").unwrap();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"53c7060628b9bb17553dbbdefa9c875437ff0396\"");

    let parsed: ObjectId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
    assert!(serde_json::from_str::<ObjectId>("\"53c7060\"").is_err());
}

#[test]
fn test_identity_key_distinguishes_modes() {
    let plain = entry("run.sh", MODE_BLOB, 9);
    let executable = entry("bin/run.sh", MODE_BLOB_EXECUTABLE, 9);

    // Same bytes, different executable bit
    assert_ne!(plain.identity_key(), executable.identity_key());

    let copy = entry("other/run.sh", MODE_BLOB, 9);
    assert_eq!(plain.identity_key(), copy.identity_key());
}

#[test]
fn test_symlink_has_identity_key() {
    let link = entry("current", MODE_LINK, 3);
    assert_eq!(link.kind, FileKind::Symlink);
    assert_eq!(
        link.identity_key(),
        Some(IdentityKey::new(MODE_LINK, ObjectId::new([3; 20])))
    );
    assert!(!link.is_executable());
}

#[test]
fn test_child_entry_kind() {
    let id = ObjectId::new([5; 20]);
    assert_eq!(
        ChildEntry::new("src", MODE_TREE, id).kind(),
        Some(FileKind::Directory)
    );
    assert_eq!(ChildEntry::new("vendor", MODE_COMMIT, id).kind(), None);
}

#[test]
fn test_relative_path_rejects_escapes() {
    for bad in ["", "/etc/passwd", "..", "a/..", "a/./b", "a/"] {
        assert!(RelativePath::new(bad).is_err(), "{bad:?} should be rejected");
    }
    let path = RelativePath::new("dir3/subdir/fdsa").unwrap();
    assert_eq!(
        path.to_path(Path::new("/export")),
        PathBuf::from("/export/dir3/subdir/fdsa")
    );
}

#[test]
fn test_entry_display() {
    let file = entry("dir/a", MODE_BLOB, 0xab);
    assert_eq!(file.to_string(), "dir/a (regular_file 100644 abababa)");
}

#[test]
fn test_config_serialization_defaults() {
    let json = r#"{
        "target": "/srv/www/release-3",
        "generations": [
            {"tree": "11cbc0a257d3f2c7631066b812710427bb8457e4", "path": "/srv/www/release-2"}
        ]
    }"#;
    let config: ExportConfig = serde_json::from_str(json).unwrap();
    assert!(config.apply_modes);
    assert_eq!(config.progress_interval, 256);
    assert_eq!(
        config.generations,
        vec![GenerationDescriptor::new(
            ObjectId::from_hex("11cbc0a257d3f2c7631066b812710427bb8457e4").unwrap(),
            "/srv/www/release-2"
        )]
    );
}

#[test]
fn test_error_kinds() {
    let err = ExportError::TargetNotEmpty {
        path: PathBuf::from("/srv/www/release-3"),
    };
    assert_eq!(err.kind(), ErrorKind::TargetNotEmpty);
    assert_eq!(err.kind().to_string(), "target_not_empty");
    assert!(err.entries().is_empty());

    let err = ExportError::resolution("nope", "no such reference");
    assert_eq!(err.kind(), ErrorKind::ObjectResolution);
    assert!(err.to_string().contains("nope"));
}
