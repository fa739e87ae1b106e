use chrono::{TimeZone, Utc};
use clouddrive_fuse::error::FsError;
use clouddrive_fuse::fuse::path_resolver::PathResolver;
use clouddrive_fuse::remote::{NodeKind, StorageUsage};
use fuser::FileType;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use crate::common::fixtures::{
    adapter_with_stats_ttl, sample_adapter, sample_drive, test_adapter, TEST_GID, TEST_UID,
};
use crate::common::mock_drive::{MockDrive, ROOT_ID};

#[test]
fn test_root_resolves_without_remote_calls() {
    let adapter = sample_adapter();
    let root = adapter.resolve("/").unwrap();
    assert_eq!(root.id, ROOT_ID);
    assert!(root.is_folder());
    assert_eq!(adapter.drive().get_call_count("child"), 0);
}

#[test]
fn test_resolution_costs_one_lookup_per_segment() {
    let adapter = sample_adapter();
    let node = adapter.resolve("/docs/b").unwrap();
    assert!(node.is_folder());
    assert_eq!(adapter.drive().get_call_count("child"), 2);
}

#[test]
fn test_resolution_is_repeated_on_every_call() {
    let adapter = sample_adapter();
    adapter.getattr("/docs/a.txt").unwrap();
    adapter.getattr("/docs/a.txt").unwrap();
    assert_eq!(adapter.drive().get_call_count("child"), 4);
}

#[test]
fn test_resolution_type_is_stable() {
    let drive = sample_drive();
    let resolver = PathResolver::new();
    for path in ["/docs", "/docs/a.txt", "/docs/b", "/notes.txt"] {
        let first = resolver.resolve(&drive, path).unwrap();
        let second = resolver.resolve(&drive, path).unwrap();
        assert_eq!(first.is_folder(), second.is_folder(), "{}", path);
        assert_eq!(first.id, second.id);
    }
}

#[test]
fn test_missing_segment_is_not_found() {
    let adapter = sample_adapter();
    for path in ["/missing", "/docs/missing", "/missing/a.txt", "/docs/b/deeper/x"] {
        match adapter.resolve(path) {
            Err(FsError::NotFound(_)) => {}
            other => panic!("{} resolved to {:?}", path, other),
        }
    }
}

#[test]
fn test_missing_segment_stops_the_walk() {
    let adapter = sample_adapter();
    assert!(adapter.resolve("/missing/a/b/c").unwrap_err().is_not_found());
    assert_eq!(adapter.drive().get_call_count("child"), 1);
}

#[test]
fn test_redundant_separators_are_ignored() {
    let adapter = sample_adapter();
    let plain = adapter.resolve("/docs/a.txt").unwrap();
    let messy = adapter.resolve("//docs///a.txt/").unwrap();
    assert_eq!(plain.id, messy.id);
}

#[test]
fn test_remote_failure_during_resolution_is_remote_error() {
    let drive = sample_drive();
    drive.fail_operation("child");
    let adapter = test_adapter(drive);
    let err = adapter.resolve("/docs").unwrap_err();
    assert!(matches!(err, FsError::Remote(_)));
    assert_eq!(err.to_errno(), libc::EIO);
}

#[test]
fn test_getattr_folder() {
    let adapter = sample_adapter();
    let attrs = adapter.getattr("/docs").unwrap();
    assert_eq!(attrs.kind, FileType::Directory);
    assert_eq!(attrs.mode(), libc::S_IFDIR as u32 | 0o755);
    assert_eq!(attrs.nlink, 4);
    assert_eq!((attrs.uid, attrs.gid), (TEST_UID, TEST_GID));
}

#[test]
fn test_getattr_folder_with_three_children_has_five_links() {
    let drive = MockDrive::new();
    drive.add_folder("/f");
    drive.add_file("/f/1", b"");
    drive.add_file("/f/2", b"");
    drive.add_folder("/f/3");
    let adapter = test_adapter(drive);
    assert_eq!(adapter.getattr("/f").unwrap().nlink, 5);
}

#[test]
fn test_getattr_file() {
    let adapter = sample_adapter();
    let attrs = adapter.getattr("/docs/a.txt").unwrap();
    assert_eq!(attrs.kind, FileType::RegularFile);
    assert_eq!(attrs.mode(), libc::S_IFREG as u32 | 0o644);
    assert_eq!(attrs.size, 11);
    assert_eq!(attrs.nlink, 1);
}

#[test]
fn test_getattr_file_without_size_is_zero() {
    let drive = sample_drive();
    drive.hide_size("/notes.txt");
    let adapter = test_adapter(drive);
    let node = adapter.resolve("/notes.txt").unwrap();
    assert_eq!(node.kind, NodeKind::File { size: None });
    assert_eq!(adapter.getattr("/notes.txt").unwrap().size, 0);
}

#[test]
fn test_getattr_reflects_latest_metadata() {
    let drive = sample_drive();
    let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    drive.set_modified("/notes.txt", stamp);
    let adapter = test_adapter(drive);
    assert_eq!(adapter.getattr("/notes.txt").unwrap().mtime, stamp.timestamp());
    assert_eq!(adapter.getattr("/notes.txt").unwrap().atime, 0);
}

#[test]
fn test_getattr_missing_is_enoent() {
    let adapter = sample_adapter();
    let err = adapter.getattr("/nope").unwrap_err();
    assert_eq!(err.to_errno(), libc::ENOENT);
}

#[test]
fn test_readdir_yields_dots_and_children() {
    let drive = MockDrive::new();
    drive.add_folder("/f");
    drive.add_file("/f/a.txt", b"x");
    drive.add_folder("/f/b");
    let adapter = test_adapter(drive);

    let names = adapter.readdir("/f").unwrap().names();
    assert_eq!(names.len(), 4);
    let set: HashSet<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(set, HashSet::from([".", "..", "a.txt", "b"]));
}

#[test]
fn test_readdir_starts_with_dot_entries() {
    let adapter = sample_adapter();
    let entries: Vec<_> = adapter.readdir("/docs").unwrap().collect();
    assert_eq!(entries[0].name, ".");
    assert_eq!(entries[1].name, "..");
    assert!(entries[0].is_dir && entries[1].is_dir);
    let b = entries.iter().find(|e| e.name == "b").unwrap();
    assert!(b.is_dir);
    let a = entries.iter().find(|e| e.name == "a.txt").unwrap();
    assert!(!a.is_dir);
}

#[test]
fn test_readdir_empty_folder() {
    let adapter = sample_adapter();
    assert_eq!(adapter.readdir("/docs/b").unwrap().names(), vec![".", ".."]);
}

#[test]
fn test_readdir_re_enumerates_each_call() {
    let adapter = sample_adapter();
    adapter.readdir("/").unwrap().names();
    adapter.drive().add_file("/new.txt", b"");
    let names = adapter.readdir("/").unwrap().names();
    assert!(names.contains(&"new.txt".to_string()));
    assert_eq!(adapter.drive().get_call_count("children"), 2);
}

#[test]
fn test_readdir_on_file_is_not_a_directory() {
    let adapter = sample_adapter();
    let err = adapter.readdir("/notes.txt").unwrap_err();
    assert!(matches!(err, FsError::NotADirectory(_)));
    assert_eq!(adapter.drive().get_call_count("children"), 0);
}

#[test]
fn test_statfs_values() {
    let drive = sample_drive();
    drive.set_usage(StorageUsage {
        total_bytes: 1024 * 1024 * 1024,
        available_bytes: 512 * 1024 * 1024,
    });
    let adapter = test_adapter(drive);
    let stats = adapter.statfs().unwrap();
    assert_eq!(stats.block_size, 1_048_576);
    assert_eq!(stats.fragment_size, 4096);
    assert_eq!(stats.blocks, 262_144);
    assert_eq!(stats.blocks_free, 131_072);
    assert_eq!(stats.blocks_available, 131_072);
    assert_eq!(stats.name_max, 255);
}

#[test]
fn test_statfs_is_cached_within_ttl() {
    let adapter = test_adapter(sample_drive());
    let first = adapter.statfs().unwrap();
    adapter.drive().set_usage(StorageUsage {
        total_bytes: 1,
        available_bytes: 1,
    });
    assert_eq!(adapter.statfs().unwrap(), first);
    assert_eq!(adapter.drive().get_call_count("storage_usage"), 1);
    assert_eq!(adapter.drive().get_call_count("child"), 0);
}

#[test]
fn test_statfs_refetches_after_ttl() {
    let adapter = adapter_with_stats_ttl(sample_drive(), Duration::from_millis(50));
    adapter.statfs().unwrap();
    thread::sleep(Duration::from_millis(150));
    adapter.drive().set_usage(StorageUsage {
        total_bytes: 8192,
        available_bytes: 4096,
    });
    let stats = adapter.statfs().unwrap();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.blocks_free, 1);
    assert_eq!(adapter.drive().get_call_count("storage_usage"), 2);
}

#[test]
fn test_statfs_failure_is_not_cached() {
    let drive = sample_drive();
    drive.fail_operation("storage_usage");
    let adapter = test_adapter(drive);
    assert_eq!(adapter.statfs().unwrap_err().to_errno(), libc::EIO);
    assert!(adapter.statfs().is_err());
    assert_eq!(adapter.drive().get_call_count("storage_usage"), 2);
}
