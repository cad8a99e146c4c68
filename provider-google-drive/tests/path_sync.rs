mod common;

use common::{client, pattern, FakeDrive};
use provider_google_drive::{
    DriveError, FileProbe, NodeId, PathResolver, RemotePath, StrictUnique,
};
use std::sync::Arc;
use tempfile::TempDir;

fn path(p: &str) -> RemotePath {
    RemotePath::parse(p).unwrap()
}

fn local_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_root_resolves_without_round_trip() {
    let drive = FakeDrive::new();
    let client = client(&drive);

    let id = client.folder_exists(&RemotePath::root()).await.unwrap();
    assert_eq!(id, Some(NodeId::root()));

    let id = client.create_folder(&RemotePath::root()).await.unwrap();
    assert_eq!(id, NodeId::root());
    assert_eq!(drive.lookups(), 0);
}

#[tokio::test]
async fn test_ensure_creates_chain_then_is_idempotent() {
    let drive = FakeDrive::new();
    let client = client(&drive);

    let first = client.create_folder(&path("a/b/c")).await.unwrap();
    assert_eq!(drive.folders_created(), 3);

    let second = client.create_folder(&path("a/b/c")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(drive.folders_created(), 3);
    assert_eq!(drive.node_count(), 3);

    // Each segment is a child of the previous one
    let a = drive.children_named(&NodeId::root(), "a");
    assert_eq!(a.len(), 1);
    let b = drive.children_named(&a[0], "b");
    assert_eq!(b.len(), 1);
    assert_eq!(drive.children_named(&b[0], "c"), vec![first.clone()]);

    assert_eq!(client.folder_exists(&path("a/b/c")).await.unwrap(), Some(first));
}

#[tokio::test]
async fn test_ensure_reuses_existing_prefix() {
    let drive = FakeDrive::new();
    let a = drive.add_folder("a", &NodeId::root());
    let client = client(&drive);

    let c = client.create_folder(&path("a/b/c")).await.unwrap();
    assert_eq!(drive.folders_created(), 2);

    let b = drive.parent_of(&c).unwrap();
    assert_eq!(drive.parent_of(&b), Some(a));
}

#[tokio::test]
async fn test_missing_segment_short_circuits() {
    let drive = FakeDrive::new();
    drive.add_folder("a", &NodeId::root());
    let client = client(&drive);

    let id = client.folder_exists(&path("a/x/y/z")).await.unwrap();
    assert!(id.is_none());
    // "a" found, "x" missing, nothing after it
    assert_eq!(drive.lookups(), 2);
}

#[tokio::test]
async fn test_one_lookup_per_segment() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    client.create_folder(&path("a/b/c/d")).await.unwrap();
    drive.reset_counters();

    client.folder_exists(&path("a/b/c/d")).await.unwrap();
    assert_eq!(drive.lookups(), 4);
}

#[tokio::test]
async fn test_file_lookup_skipped_when_folder_missing() {
    let drive = FakeDrive::new();
    let client = client(&drive);

    let id = client.file_exists(&path("nope/file.txt")).await.unwrap();
    assert!(id.is_none());
    assert_eq!(drive.lookups(), 1);
}

#[tokio::test]
async fn test_resolution_ignores_files_named_like_folders() {
    let drive = FakeDrive::new();
    drive.add_file("a", &NodeId::root(), b"not a folder");
    let client = client(&drive);

    assert!(client.folder_exists(&path("a")).await.unwrap().is_none());

    // A file of the same name does not stop the folder being created
    let folder = client.create_folder(&path("a")).await.unwrap();
    assert_eq!(drive.children_named(&NodeId::root(), "a").len(), 2);
    assert_eq!(client.folder_exists(&path("a")).await.unwrap(), Some(folder));
}

#[tokio::test]
async fn test_trashed_nodes_are_invisible() {
    let drive = FakeDrive::new();
    let old = drive.add_folder("a", &NodeId::root());
    drive.trash(&old);
    let client = client(&drive);

    assert!(client.folder_exists(&path("a")).await.unwrap().is_none());
    let fresh = client.create_folder(&path("a")).await.unwrap();
    assert_ne!(fresh, old);
}

#[tokio::test]
async fn test_first_match_picks_first_duplicate() {
    let drive = FakeDrive::new();
    let first = drive.add_folder("dup", &NodeId::root());
    let _second = drive.add_folder("dup", &NodeId::root());
    let client = client(&drive);

    assert_eq!(client.folder_exists(&path("dup")).await.unwrap(), Some(first));
}

#[tokio::test]
async fn test_strict_unique_reports_duplicates() {
    let drive = FakeDrive::new();
    drive.add_folder("dup", &NodeId::root());
    drive.add_folder("dup", &NodeId::root());
    let client = client(&drive).with_strategy(Arc::new(StrictUnique));

    let err = client.folder_exists(&path("dup/inner")).await.unwrap_err();
    match err {
        DriveError::AmbiguousPath {
            parent_id,
            name,
            matches,
        } => {
            assert_eq!(parent_id, "root");
            assert_eq!(name, "dup");
            assert_eq!(matches, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Unique names still resolve
    drive.add_folder("solo", &NodeId::root());
    assert!(client.folder_exists(&path("solo")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_probe_reports_parent_for_reuse() {
    let drive = FakeDrive::new();
    let resolver = PathResolver::new(drive.clone());
    let docs = drive.add_folder("docs", &NodeId::root());
    let file = drive.add_file("f.txt", &docs, b"x");

    assert_eq!(
        resolver.probe_file(&path("docs"), "f.txt").await.unwrap(),
        FileProbe::Found {
            file_id: file.clone(),
            parent_id: docs.clone(),
        }
    );
    assert_eq!(
        resolver.probe_file(&path("docs"), "g.txt").await.unwrap(),
        FileProbe::Missing { parent_id: docs }
    );
    assert_eq!(
        resolver.probe_file(&path("other"), "f.txt").await.unwrap(),
        FileProbe::ParentMissing
    );
    assert_eq!(
        resolver.resolve_file(&path("docs"), "f.txt").await.unwrap(),
        Some(file)
    );
}

#[tokio::test]
async fn test_partial_chain_failure_can_resume() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    drive.fail_folder_creation("c");

    let err = client.create_folder(&path("a/b/c/d")).await.unwrap_err();
    assert!(err.is_transfer_failure());

    let checkpoint = match err {
        DriveError::FolderChainIncomplete { checkpoint, source } => {
            assert_eq!(source.status_code(), Some(500));
            checkpoint
        }
        other => panic!("unexpected error: {other:?}"),
    };

    let names: Vec<&str> = checkpoint.resolved.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(checkpoint.remaining(), ["c", "d"]);
    // No rollback: a and b stay
    assert_eq!(drive.folders_created(), 2);

    drive.reset_counters();
    let d = client.resume_folder(&checkpoint).await.unwrap();
    assert_eq!(drive.folders_created(), 2);
    // Resumed from b: only c and d were looked up
    assert_eq!(drive.lookups(), 2);

    let c = drive.parent_of(&d).unwrap();
    assert_eq!(drive.parent_of(&c), Some(checkpoint.last_id()));
    assert_eq!(client.folder_exists(&path("a/b/c/d")).await.unwrap(), Some(d));
}

#[tokio::test]
async fn test_upload_creates_then_updates_in_place() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "fileF", b"first version");

    let created = client.upload_file(&file, &path("a/b")).await.unwrap();
    assert_eq!(drive.folders_created(), 2);
    assert_eq!(drive.content(&created).unwrap(), b"first version");

    std::fs::write(&file, b"second version, longer").unwrap();
    let updated = client.upload_file(&file, &path("a/b")).await.unwrap();

    assert_eq!(updated, created);
    assert_eq!(drive.folders_created(), 2);
    assert_eq!(drive.content(&created).unwrap(), b"second version, longer");

    let b = client.folder_exists(&path("a/b")).await.unwrap().unwrap();
    assert_eq!(drive.children_named(&b, "fileF"), vec![created.clone()]);
    assert_eq!(
        client.file_exists(&path("a/b/fileF")).await.unwrap(),
        Some(created)
    );
}

#[tokio::test]
async fn test_upload_into_existing_folder_reuses_probe() {
    let drive = FakeDrive::new();
    let docs = drive.add_folder("docs", &NodeId::root());
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "notes.txt", b"hello");

    let id = client.upload_file(&file, &path("docs")).await.unwrap();
    assert_eq!(drive.parent_of(&id), Some(docs));
    // Folder lookup plus file lookup, no second resolution
    assert_eq!(drive.lookups(), 2);
    assert_eq!(drive.folders_created(), 0);
}

#[tokio::test]
async fn test_update_does_not_reparent() {
    let drive = FakeDrive::new();
    let docs = drive.add_folder("docs", &NodeId::root());
    let existing = drive.add_file("notes.txt", &docs, b"old");
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "notes.txt", b"new");

    let id = client.upload_file(&file, &path("docs")).await.unwrap();
    assert_eq!(id, existing);
    assert_eq!(drive.parent_of(&id), Some(docs));
    assert_eq!(drive.content(&id).unwrap(), b"new");
}

#[tokio::test]
async fn test_upload_to_root() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "top.txt", b"x");

    let id = client.upload_file(&file, &RemotePath::root()).await.unwrap();
    assert_eq!(drive.parent_of(&id), Some(NodeId::root()));
}

#[tokio::test]
async fn test_multi_chunk_round_trip() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    // Two full 256 KiB chunks and a partial one
    let content = pattern(2 * 256 * 1024 + 1000);
    let file = local_file(&dir, "big.bin", &content);

    let id = client.upload_file(&file, &path("blobs")).await.unwrap();
    assert_eq!(drive.chunks_sent(), 3);
    assert_eq!(drive.content(&id).unwrap(), content);

    let target = dir.path().join("out").join("big.bin");
    client
        .download_file(&target, &path("blobs/big.bin"))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), content);
}

#[tokio::test]
async fn test_empty_file_round_trip() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "empty", b"");

    let id = client.upload_file(&file, &path("e")).await.unwrap();
    assert_eq!(drive.chunks_sent(), 1);
    assert_eq!(drive.content(&id).unwrap(), Vec::<u8>::new());

    let target = dir.path().join("empty.out");
    client.download_file(&target, &path("e/empty")).await.unwrap();
    assert!(std::fs::read(&target).unwrap().is_empty());
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let drive = FakeDrive::new();
    drive.add_folder("docs", &NodeId::root());
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("x");

    let err = client
        .download_file(&target, &path("docs/missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::NotFound { path } if path == "docs/missing.txt"));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_download_root_path_is_invalid() {
    let drive = FakeDrive::new();
    let client = client(&drive);
    let dir = TempDir::new().unwrap();

    let err = client
        .download_file(&dir.path().join("x"), &RemotePath::root())
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::InvalidPath(_)));
}

#[tokio::test]
async fn test_missing_local_file_is_local_io() {
    let drive = FakeDrive::new();
    let docs = drive.add_folder("docs", &NodeId::root());
    let client = client(&drive);
    let dir = TempDir::new().unwrap();

    let err = client
        .upload_file(&dir.path().join("absent.txt"), &path("docs"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::LocalIo { .. }));
    assert!(drive.children_named(&docs, "absent.txt").is_empty());
}

#[tokio::test]
async fn test_upload_failure_in_folder_chain_surfaces_checkpoint() {
    let drive = FakeDrive::new();
    drive.fail_folder_creation("b");
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "f", b"data");

    let err = client.upload_file(&file, &path("a/b")).await.unwrap_err();
    assert!(matches!(err, DriveError::FolderChainIncomplete { .. }));
    assert!(err.is_transfer_failure());
    assert_eq!(drive.folders_created(), 1);
}

#[tokio::test]
async fn test_chunk_failure_aborts_new_upload() {
    let drive = FakeDrive::new();
    drive.fail_upload_chunk(2);
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "big.bin", &pattern(2 * 256 * 1024 + 1000));

    let err = client.upload_file(&file, &path("blobs")).await.unwrap_err();
    assert!(matches!(err, DriveError::TransferFailure { .. }));
    assert!(err.is_transfer_failure());
    assert_eq!(err.status_code(), Some(503));

    // Nothing is sent after the failed chunk and no file node appears
    assert_eq!(drive.chunks_sent(), 2);
    let blobs = client.folder_exists(&path("blobs")).await.unwrap().unwrap();
    assert!(drive.children_named(&blobs, "big.bin").is_empty());
}

#[tokio::test]
async fn test_chunk_failure_keeps_previous_content() {
    let drive = FakeDrive::new();
    let docs = drive.add_folder("docs", &NodeId::root());
    let existing = drive.add_file("report.bin", &docs, b"old");
    drive.fail_upload_chunk(2);
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let file = local_file(&dir, "report.bin", &pattern(2 * 256 * 1024 + 1000));

    let err = client.upload_file(&file, &path("docs")).await.unwrap_err();
    assert!(err.is_transfer_failure());
    assert_eq!(drive.chunks_sent(), 2);
    assert_eq!(drive.content(&existing).unwrap(), b"old".to_vec());
    assert_eq!(drive.children_named(&docs, "report.bin"), vec![existing]);
}

#[tokio::test]
async fn test_failed_download_leaves_partial_file() {
    let drive = FakeDrive::new();
    let blobs = drive.add_folder("blobs", &NodeId::root());
    let content = pattern(250_000);
    drive.add_file("big.bin", &blobs, &content);
    // The first 100_000-byte range succeeds, the second fails
    drive.fail_reads_from(100_000);
    let client = client(&drive);
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("big.bin");

    let err = client
        .download_file(&target, &path("blobs/big.bin"))
        .await
        .unwrap_err();
    assert!(err.is_transfer_failure());
    assert_eq!(std::fs::read(&target).unwrap(), content[..100_000].to_vec());
}
