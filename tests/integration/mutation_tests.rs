use clouddrive_fuse::error::FsError;

use crate::common::fixtures::{test_adapter, sample_adapter, sample_drive};
use crate::common::mock_drive::MockDrive;

#[test]
fn test_unlink_file() {
    let adapter = sample_adapter();
    adapter.unlink("/docs/a.txt").unwrap();
    assert!(!adapter.drive().exists("/docs/a.txt"));
    assert!(adapter.getattr("/docs/a.txt").unwrap_err().is_not_found());
}

#[test]
fn test_unlink_folder_is_permission_denied_and_keeps_children() {
    let adapter = sample_adapter();
    let before = adapter.drive().node_count();
    let err = adapter.unlink("/docs").unwrap_err();
    assert!(matches!(err, FsError::PermissionDenied(_)));
    assert_eq!(err.to_errno(), libc::EACCES);
    assert_eq!(adapter.drive().get_call_count("delete"), 0);
    assert_eq!(adapter.drive().node_count(), before);
    assert!(adapter.drive().exists("/docs/a.txt"));
    assert!(adapter.drive().exists("/docs/b"));
}

#[test]
fn test_unlink_missing_is_not_found() {
    let adapter = sample_adapter();
    assert!(adapter.unlink("/docs/zzz").unwrap_err().is_not_found());
}

#[test]
fn test_rmdir_empty_folder() {
    let adapter = sample_adapter();
    adapter.rmdir("/docs/b").unwrap();
    assert!(!adapter.drive().exists("/docs/b"));
}

#[test]
fn test_rmdir_file_is_not_a_directory() {
    let adapter = sample_adapter();
    let err = adapter.rmdir("/notes.txt").unwrap_err();
    assert!(matches!(err, FsError::NotADirectory(_)));
    assert!(adapter.drive().exists("/notes.txt"));
}

#[test]
fn test_rmdir_non_empty_folder_is_refused() {
    let adapter = sample_adapter();
    let err = adapter.rmdir("/docs").unwrap_err();
    assert_eq!(err.to_errno(), libc::ENOTEMPTY);
    assert!(adapter.drive().exists("/docs/a.txt"));
    assert_eq!(adapter.drive().get_call_count("delete"), 0);
}

#[test]
fn test_rmdir_root_is_refused() {
    let adapter = sample_adapter();
    assert_eq!(adapter.rmdir("/").unwrap_err().to_errno(), libc::EACCES);
}

#[test]
fn test_mkdir_creates_folder() {
    let adapter = sample_adapter();
    adapter.mkdir("/docs/c").unwrap();
    assert_eq!(adapter.drive().is_folder_at("/docs/c"), Some(true));
    let attrs = adapter.getattr("/docs/c").unwrap();
    assert_eq!(attrs.nlink, 2);
}

#[test]
fn test_mkdir_under_file_is_not_a_directory_and_creates_nothing() {
    let adapter = sample_adapter();
    let before = adapter.drive().node_count();
    let err = adapter.mkdir("/notes.txt/sub").unwrap_err();
    assert!(matches!(err, FsError::NotADirectory(_)));
    assert_eq!(adapter.drive().get_call_count("mkdir"), 0);
    assert_eq!(adapter.drive().node_count(), before);
}

#[test]
fn test_mkdir_existing_name_already_exists() {
    let adapter = sample_adapter();
    let err = adapter.mkdir("/docs/b").unwrap_err();
    assert_eq!(err.to_errno(), libc::EEXIST);
    assert_eq!(adapter.drive().get_call_count("mkdir"), 0);
}

#[test]
fn test_mkdir_missing_parent_is_not_found() {
    let adapter = sample_adapter();
    assert!(adapter.mkdir("/a/b/c").unwrap_err().is_not_found());
}

#[test]
fn test_rename_within_folder() {
    let adapter = sample_adapter();
    adapter.rename("/docs/a.txt", "/docs/renamed.txt").unwrap();
    assert!(!adapter.drive().exists("/docs/a.txt"));
    assert_eq!(
        adapter.drive().content_of("/docs/renamed.txt").unwrap(),
        b"hello world"
    );
    assert_eq!(adapter.drive().get_call_count("rename"), 1);
    assert_eq!(adapter.drive().get_call_count("move_to"), 0);
}

#[test]
fn test_rename_folder_keeps_subtree() {
    let adapter = sample_adapter();
    adapter.rename("/docs", "/papers").unwrap();
    assert!(adapter.drive().exists("/papers/a.txt"));
    assert!(adapter.drive().exists("/papers/b"));
}

#[test]
fn test_rename_across_folders_moves() {
    let adapter = sample_adapter();
    adapter.rename("/notes.txt", "/docs/b/notes-moved.txt").unwrap();
    assert!(!adapter.drive().exists("/notes.txt"));
    assert_eq!(
        adapter.drive().content_of("/docs/b/notes-moved.txt").unwrap(),
        b"remember"
    );
    assert_eq!(adapter.drive().get_call_count("move_to"), 1);
}

#[test]
fn test_rename_into_file_parent_is_not_a_directory() {
    let adapter = sample_adapter();
    let err = adapter.rename("/docs/a.txt", "/notes.txt/a.txt").unwrap_err();
    assert!(matches!(err, FsError::NotADirectory(_)));
    assert!(adapter.drive().exists("/docs/a.txt"));
}

#[test]
fn test_rename_missing_source_is_not_found() {
    let adapter = sample_adapter();
    assert!(adapter.rename("/docs/zzz", "/docs/yyy").unwrap_err().is_not_found());
    assert_eq!(adapter.drive().mutation_count(), 0);
}

#[test]
fn test_rename_replaces_existing_file() {
    let adapter = sample_adapter();
    adapter.rename("/notes.txt", "/docs/a.txt").unwrap();
    assert!(!adapter.drive().exists("/notes.txt"));
    assert_eq!(adapter.drive().content_of("/docs/a.txt").unwrap(), b"remember");
    assert_eq!(adapter.drive().get_call_count("delete"), 1);
}

#[test]
fn test_rename_no_replace_refuses_existing_destination() {
    let adapter = sample_adapter();
    let err = adapter.rename_no_replace("/notes.txt", "/docs/a.txt").unwrap_err();
    assert_eq!(err.to_errno(), libc::EEXIST);
    assert_eq!(adapter.drive().mutation_count(), 0);
}

#[test]
fn test_rename_onto_folder_already_exists() {
    let adapter = sample_adapter();
    let err = adapter.rename("/notes.txt", "/docs/b").unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists(_)));
    assert_eq!(adapter.drive().mutation_count(), 0);
}

#[test]
fn test_rename_folder_over_file_is_not_a_directory() {
    let adapter = sample_adapter();
    let err = adapter.rename("/docs/b", "/notes.txt").unwrap_err();
    assert_eq!(err.to_errno(), libc::ENOTDIR);
    assert!(adapter.drive().exists("/notes.txt"));
}

#[test]
fn test_rename_onto_itself_is_a_no_op() {
    let adapter = sample_adapter();
    adapter.rename("/notes.txt", "/notes.txt").unwrap();
    assert_eq!(adapter.drive().mutation_count(), 0);
    assert!(adapter.drive().exists("/notes.txt"));
}

#[test]
fn test_rename_root_is_permission_denied() {
    let adapter = sample_adapter();
    assert_eq!(adapter.rename("/", "/x").unwrap_err().to_errno(), libc::EACCES);
}

#[test]
fn test_delete_failure_is_eio() {
    let drive = sample_drive();
    drive.fail_operation("delete");
    let adapter = test_adapter(drive);
    assert_eq!(adapter.unlink("/notes.txt").unwrap_err().to_errno(), libc::EIO);
    assert!(adapter.drive().exists("/notes.txt"));
}

#[test]
fn test_mutations_on_fresh_drive() {
    let adapter = test_adapter(MockDrive::new());
    adapter.mkdir("/a").unwrap();
    adapter.create("/a/f").unwrap();
    adapter.write("/a/f", b"abc", 0).unwrap();
    adapter.rename("/a/f", "/g").unwrap();
    adapter.rmdir("/a").unwrap();
    assert_eq!(adapter.readdir("/").unwrap().names(), vec![".", "..", "g"]);
    assert_eq!(adapter.read("/g", 3, 0).unwrap(), b"abc");
}
