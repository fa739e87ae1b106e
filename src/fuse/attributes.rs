//! Attribute synthesis for remote nodes

use chrono::{DateTime, Utc};
use fuser::{FileAttr, FileType};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::remote::{DriveNode, NodeKind};

const FOLDER_PERM: u16 = 0o755;
const FILE_PERM: u16 = 0o644;

/// POSIX attributes derived from a node's metadata. Times are epoch seconds,
/// 0 when the service did not report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttributes {
    pub kind: FileType,
    pub perm: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub nlink: u32,
    pub atime: i64,
    pub ctime: i64,
    pub mtime: i64,
    pub crtime: i64,
}

impl FileAttributes {
    /// Full mode word, type bits included
    pub fn mode(&self) -> u32 {
        let type_bits = match self.kind {
            FileType::Directory => libc::S_IFDIR,
            _ => libc::S_IFREG,
        };
        type_bits as u32 | u32::from(self.perm)
    }

    pub fn to_file_attr(&self, ino: u64) -> FileAttr {
        FileAttr {
            ino,
            size: self.size,
            blocks: self.size.div_ceil(512),
            atime: epoch_to_system_time(self.atime),
            mtime: epoch_to_system_time(self.mtime),
            ctime: epoch_to_system_time(self.ctime),
            crtime: epoch_to_system_time(self.crtime),
            kind: self.kind,
            perm: self.perm,
            nlink: self.nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            flags: 0,
            blksize: 512,
        }
    }
}

fn epoch_seconds(time: Option<DateTime<Utc>>) -> i64 {
    time.map(|t| t.timestamp()).unwrap_or(0)
}

fn epoch_to_system_time(secs: i64) -> SystemTime {
    if secs > 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH
    }
}

/// Builds attributes for nodes on behalf of the mounting process.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSynthesizer {
    uid: u32,
    gid: u32,
}

impl AttributeSynthesizer {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Owner is the effective user and group of the running process.
    pub fn for_current_process() -> Self {
        // geteuid/getegid cannot fail
        let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
        Self::new(uid, gid)
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn gid(&self) -> u32 {
        self.gid
    }

    pub fn synthesize(&self, node: &DriveNode) -> FileAttributes {
        let (kind, perm, size, nlink) = match node.kind {
            NodeKind::Folder { child_count } => (
                FileType::Directory,
                FOLDER_PERM,
                0,
                u32::try_from(child_count.saturating_add(2)).unwrap_or(u32::MAX),
            ),
            NodeKind::File { size } => (FileType::RegularFile, FILE_PERM, size.unwrap_or(0), 1),
        };

        FileAttributes {
            kind,
            perm,
            uid: self.uid,
            gid: self.gid,
            size,
            nlink,
            atime: epoch_seconds(node.times.last_opened),
            ctime: epoch_seconds(node.times.changed),
            mtime: epoch_seconds(node.times.modified),
            crtime: epoch_seconds(node.times.created),
        }
    }
}
