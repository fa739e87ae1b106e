use clouddrive_fuse::fuse::filesystem::{mount_options, CloudDriveFuse};
use clouddrive_fuse::fuse::inode::{InodeTable, ROOT_INO, UNKNOWN_INO};
use clouddrive_fuse::fuse::path_resolver::join_path;
use fuser::MountOption;
use std::time::Duration;

use crate::common::fixtures::{sample_adapter, test_adapter};
use crate::common::mock_drive::MockDrive;

#[test]
fn test_filesystem_wraps_adapter() {
    let fs = CloudDriveFuse::new(sample_adapter(), Duration::from_secs(1));
    let attrs = fs.adapter().getattr("/docs/a.txt").unwrap();
    let fattr = attrs.to_file_attr(42);
    assert_eq!(fattr.ino, 42);
    assert_eq!(fattr.size, 11);
    assert_eq!(fattr.perm, 0o644);
}

#[test]
fn test_inode_paths_follow_adapter_rename() {
    let adapter = sample_adapter();
    let mut inodes = InodeTable::new();
    let docs = inodes.lookup("/docs");
    let file = inodes.lookup("/docs/a.txt");

    adapter.rename("/docs", "/papers").unwrap();
    inodes.rename_path("/docs", "/papers");

    assert_eq!(inodes.path(docs), Some("/papers"));
    let path = inodes.path(file).unwrap().to_string();
    assert_eq!(path, "/papers/a.txt");
    assert_eq!(adapter.getattr(&path).unwrap().size, 11);
    assert_eq!(inodes.parent_ino(docs), ROOT_INO);
}

#[test]
fn test_inode_dropped_after_unlink() {
    let adapter = sample_adapter();
    let mut inodes = InodeTable::new();
    let ino = inodes.lookup("/notes.txt");
    adapter.unlink("/notes.txt").unwrap();
    inodes.remove_path("/notes.txt");
    assert_eq!(inodes.path(ino), None);
}

#[test]
fn test_listing_does_not_grow_inode_table() {
    let drive = MockDrive::new();
    drive.add_folder("/big");
    for i in 0..500 {
        drive.add_file(&format!("/big/f{}", i), b"");
    }
    let adapter = test_adapter(drive);
    let mut inodes = InodeTable::new();
    let seen = inodes.lookup("/big/f7");

    for _ in 0..3 {
        for entry in adapter.readdir("/big").unwrap().skip(2) {
            let ino = inodes.listing_ino(&join_path("/big", &entry.name));
            if entry.name == "f7" {
                assert_eq!(ino, seen);
            } else {
                assert_eq!(ino, UNKNOWN_INO);
            }
        }
    }
    assert_eq!(inodes.len(), 2);
}

#[test]
fn test_default_mount_options() {
    let options = mount_options(false);
    assert!(options.contains(&MountOption::FSName("clouddrive".to_string())));
    assert!(options.contains(&MountOption::Subtype("clouddrive".to_string())));
    assert!(options.contains(&MountOption::NoAtime));
    assert!(!options.contains(&MountOption::AllowOther));
}
