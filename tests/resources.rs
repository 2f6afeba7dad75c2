// tests/resources.rs

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use batchdag::errors::BatchdagError;
use batchdag::fs::mock::MockFileSystem;
use batchdag::fs::{FileSystem, RealFileSystem, WriteMode};
use batchdag::naming::{BindContext, NamingExt};
use batchdag::resource::{EntryKind, NameFilter, Ports, Resource};
use batchdag_test_utils::builders::{file_in, folder_in};
use tempfile::TempDir;

fn mock() -> (MockFileSystem, Arc<dyn FileSystem>) {
    let mock = MockFileSystem::new();
    let fs: Arc<dyn FileSystem> = Arc::new(mock.clone());
    (mock, fs)
}

fn ctx(overwrite: bool) -> BindContext {
    BindContext::top_level(Some("lot".to_string()), false, overwrite)
}

#[test]
fn test_write_without_overwrite_keeps_prior_content() {
    let (mock, fs) = mock();
    mock.add_file("data/lot_report.txt", "old\n");

    let mut report = file_in(&fs, "data", "report.txt");
    report.bind(&ctx(false)).unwrap();

    let err = report.open_write(WriteMode::Truncate).err().unwrap();
    assert!(matches!(err, BatchdagError::OverwriteRefused(ref p) if p == &PathBuf::from("data/lot_report.txt")));
    assert_eq!(mock.contents("data/lot_report.txt").unwrap(), b"old\n".to_vec());
}

#[test]
fn test_write_with_overwrite_replaces_content() {
    let (mock, fs) = mock();
    mock.add_file("data/lot_report.txt", "old\n");

    let mut report = file_in(&fs, "data", "report.txt");
    report.bind(&ctx(true)).unwrap();

    let mut w = report.open_write(WriteMode::Truncate).unwrap();
    writeln!(w, "new").unwrap();
    drop(w);
    assert_eq!(report.read_to_string().unwrap(), "new\n");
}

#[test]
fn test_write_creates_missing_directory() {
    let (mock, fs) = mock();
    let mut out = file_in(&fs, "deep/nested", "out.txt");
    out.bind(&ctx(false)).unwrap();

    assert!(!out.exists().unwrap());
    out.open_write(WriteMode::Append).unwrap().write_all(b"x").unwrap();
    assert!(out.exists().unwrap());
    assert_eq!(mock.contents("deep/nested/lot_out.txt").unwrap(), b"x".to_vec());
}

#[test]
fn test_file_dir_occupied_by_file_collides() {
    let (mock, fs) = mock();
    mock.add_file("data", "not a dir");

    let mut out = file_in(&fs, "data", "out.txt");
    out.bind(&ctx(false)).unwrap();
    let err = out.prepare_write().unwrap_err();
    assert!(matches!(err, BatchdagError::PathKindCollision { expected: "directory", .. }), "got {err:?}");
}

#[test]
fn test_folder_over_existing_file_collides() {
    let (mock, fs) = mock();
    mock.add_file("data/lot_images", "oops");

    let mut images = folder_in(&fs, "data", "images");
    images.bind(&ctx(false)).unwrap();

    assert!(!images.exists().unwrap());
    let err = images.ensure_created().unwrap_err();
    assert!(matches!(err, BatchdagError::PathKindCollision { .. }), "got {err:?}");
}

#[test]
fn test_folder_child_kind_collision() {
    let (_mock, fs) = mock();
    let mut images = folder_in(&fs, "data", "images");
    images.bind(&ctx(false)).unwrap();

    images.ensure_child_dir("thumbs").unwrap();
    let err = images.open_child_write("thumbs", WriteMode::Truncate).err().unwrap();
    assert!(matches!(err, BatchdagError::PathKindCollision { .. }), "got {err:?}");

    images.open_child_write("a.png", WriteMode::Truncate).unwrap();
    let err = images.child_path("a.png", EntryKind::Dir).unwrap_err();
    assert!(matches!(err, BatchdagError::PathKindCollision { .. }), "got {err:?}");
}

#[test]
fn test_folder_child_overwrite_is_guarded() {
    let (mock, fs) = mock();
    mock.add_file("data/lot_images/a.png", "v1");

    let mut images = folder_in(&fs, "data", "images");
    images.bind(&ctx(false)).unwrap();
    let err = images.open_child_write("a.png", WriteMode::Truncate).err().unwrap();
    assert!(matches!(err, BatchdagError::OverwriteRefused(_)), "got {err:?}");

    let mut buf = String::new();
    images.open_child_read("a.png").unwrap().read_to_string(&mut buf).unwrap();
    assert_eq!(buf, "v1");
}

#[test]
fn test_existing_folder_refuses_prepare_without_overwrite() {
    let (mock, fs) = mock();
    mock.add_file("data/lot_images/a.png", "v1");

    let mut images = folder_in(&fs, "data", "images");
    images.bind(&ctx(false)).unwrap();
    assert!(images.exists().unwrap());
    assert!(matches!(images.prepare_write(), Err(BatchdagError::OverwriteRefused(_))));

    images.bind(&ctx(true)).unwrap();
    images.prepare_write().unwrap();
}

#[test]
fn test_folder_lists_filtered_files_only() {
    let (mock, fs) = mock();
    for name in ["b.png", "a.png", "notes.txt", "skip_me.png"] {
        mock.add_file(format!("data/lot_images/{name}"), "x");
    }
    fs.create_dir_all(&PathBuf::from("data/lot_images/sub.png")).unwrap();

    let mut images = folder_in(&fs, "data", "images");
    images.bind(&ctx(false)).unwrap();

    let filter = NameFilter::new(&["*.png"], &["skip_*"]).unwrap();
    let files = images.files(&filter).unwrap();
    assert_eq!(
        files,
        vec![
            PathBuf::from("data/lot_images/a.png"),
            PathBuf::from("data/lot_images/b.png"),
        ]
    );
    assert_eq!(images.files(&NameFilter::any()).unwrap().len(), 4);
}

#[test]
fn test_ports_lookup_by_key_and_index() {
    let (_mock, fs) = mock();
    let named = Ports::named([
        ("left", file_in(&fs, "d", "l.txt")),
        ("right", file_in(&fs, "d", "r.txt")),
    ]);
    assert_eq!(named.len(), 2);
    assert_eq!(named.get("right").unwrap().label(), "r.txt");
    assert!(named.get("middle").is_none());

    let ordered = Ports::ordered([file_in(&fs, "d", "0.txt"), file_in(&fs, "d", "1.txt")]);
    assert_eq!(ordered.get("1").unwrap().label(), "1.txt");
    assert!(ordered.get("2").is_none());

    let single = Ports::single(file_in(&fs, "d", "only.txt"));
    assert_eq!(single.first().unwrap().label(), "only.txt");
    assert!(Ports::None.is_empty());
}

#[test]
fn test_ports_bind_every_resource() {
    let (_mock, fs) = mock();
    let mut ports = Ports::ordered([
        file_in(&fs, "d", "a.txt"),
        file_in(&fs, "d", "b.txt").independent(),
    ]);
    ports.bind_all(&ctx(false)).unwrap();

    let paths: Vec<PathBuf> = ports.resources().iter().map(|r| r.path().unwrap()).collect();
    assert_eq!(paths, vec![PathBuf::from("d/lot_a.txt"), PathBuf::from("d/b.txt")]);
}

#[test]
fn test_real_filesystem_round_trip() {
    let dir = TempDir::new().unwrap();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let mut out = file_in(&fs, dir.path().join("out"), "table.csv");
    out.bind(&ctx(false)).unwrap();
    writeln!(out.open_write(WriteMode::Truncate).unwrap(), "a,b").unwrap();

    assert!(dir.path().join("out/lot_table.csv").is_file());
    assert_eq!(out.read_to_string().unwrap(), "a,b\n");
    assert!(matches!(out.open_write(WriteMode::Truncate), Err(BatchdagError::OverwriteRefused(_))));
}
