//! FUSE filesystem operations implementation

use fuser::{
    FileType, KernelConfig, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyStatfs, ReplyWrite, Request, TimeOrNow,
};
use libc::c_int;
use log::{debug, error, info, warn};
use std::ffi::OsStr;
use std::time::SystemTime;

use crate::error::FsError;
use crate::fuse::filesystem::CloudDriveFuse;
use crate::fuse::path_resolver::join_path;
use crate::remote::RemoteDrive;

/// Logs a failed operation and returns its errno. Missing paths are routine
/// and only logged at debug level.
fn errno(op: &str, target: &str, err: &FsError) -> c_int {
    if err.is_not_found() {
        debug!("{}: {} not found", op, target);
    } else if let FsError::Remote(_) = err {
        error!("{} failed for {}: {}", op, target, err);
    } else {
        warn!("{} failed for {}: {}", op, target, err);
    }
    err.to_errno()
}

impl<D: RemoteDrive> CloudDriveFuse<D> {
    fn reply_entry(&mut self, op: &str, path: &str, reply: ReplyEntry) {
        match self.adapter().getattr(path) {
            Ok(attrs) => {
                let ino = self.inodes().lookup(path);
                reply.entry(self.attr_ttl(), &attrs.to_file_attr(ino), 0);
            }
            Err(e) => reply.error(errno(op, path, &e)),
        }
    }
}

impl<D: RemoteDrive> fuser::Filesystem for CloudDriveFuse<D> {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        info!("Cloud drive filesystem initialized");
        Ok(())
    }

    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        debug!("LOOKUP: parent={}, name={}", parent, name.to_string_lossy());
        let path = match self.child_path_of(parent, name) {
            Ok(path) => path,
            Err(e) => return reply.error(errno("LOOKUP", &name.to_string_lossy(), &e)),
        };
        self.reply_entry("LOOKUP", &path, reply);
    }

    fn forget(&mut self, _req: &Request, ino: u64, nlookup: u64) {
        debug!("FORGET: ino={}, nlookup={}", ino, nlookup);
        self.inodes().forget(ino, nlookup);
    }

    fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let result = self
            .path_of(ino)
            .and_then(|path| self.adapter().getattr(&path));
        match result {
            Ok(attrs) => reply.attr(self.attr_ttl(), &attrs.to_file_attr(ino)),
            Err(e) => reply.error(errno("GETATTR", &format!("inode {}", ino), &e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!("SETATTR: ino={}, size={:?}", ino, size);
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(e) => return reply.error(errno("SETATTR", &format!("inode {}", ino), &e)),
        };
        if let Some(size) = size {
            if let Err(e) = self.adapter().truncate(&path, size) {
                return reply.error(errno("SETATTR", &path, &e));
            }
        }
        match self.adapter().getattr(&path) {
            Ok(attrs) => reply.attr(self.attr_ttl(), &attrs.to_file_attr(ino)),
            Err(e) => reply.error(errno("SETATTR", &path, &e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(e) => return reply.error(errno("READDIR", &format!("inode {}", ino), &e)),
        };
        let listing = match self.adapter().readdir(&path) {
            Ok(listing) => listing,
            Err(e) => return reply.error(errno("READDIR", &path, &e)),
        };

        let parent_ino = self.inodes().parent_ino(ino);
        let skip = usize::try_from(offset).unwrap_or(0);
        for (index, entry) in listing.enumerate().skip(skip) {
            let entry_ino = match entry.name.as_str() {
                "." => ino,
                ".." => parent_ino,
                name => self.inodes().listing_ino(&join_path(&path, name)),
            };
            let kind = if entry.is_dir {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            // Offset of the entry after this one
            if reply.add(entry_ino, (index + 1) as i64, kind, &entry.name) {
                break;
            }
        }
        reply.ok();
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        debug!("CREATE: parent={}, name={}", parent, name.to_string_lossy());
        let result = self.child_path_of(parent, name).and_then(|path| {
            self.adapter().create(&path)?;
            let attrs = self.adapter().getattr(&path)?;
            Ok((path, attrs))
        });
        match result {
            Ok((path, attrs)) => {
                let ino = self.inodes().lookup(&path);
                reply.created(self.attr_ttl(), &attrs.to_file_attr(ino), 0, 0, 0);
            }
            Err(e) => reply.error(errno("CREATE", &name.to_string_lossy(), &e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);
        let result = self
            .path_of(ino)
            .and_then(|path| self.adapter().write(&path, data, offset));
        match result {
            Ok(written) => reply.written(written as u32),
            Err(e) => reply.error(errno("WRITE", &format!("inode {}", ino), &e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let offset = u64::try_from(offset).unwrap_or(0);
        let result = self
            .path_of(ino)
            .and_then(|path| self.adapter().read(&path, u64::from(size), offset));
        match result {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(errno("READ", &format!("inode {}", ino), &e)),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let path = match self.child_path_of(parent, name) {
            Ok(path) => path,
            Err(e) => return reply.error(errno("MKDIR", &name.to_string_lossy(), &e)),
        };
        match self.adapter().mkdir(&path) {
            Ok(()) => self.reply_entry("MKDIR", &path, reply),
            Err(e) => reply.error(errno("MKDIR", &path, &e)),
        }
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let result = self.child_path_of(parent, name).and_then(|path| {
            self.adapter().unlink(&path)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                self.inodes().remove_path(&path);
                reply.ok();
            }
            Err(e) => reply.error(errno("UNLINK", &name.to_string_lossy(), &e)),
        }
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let result = self.child_path_of(parent, name).and_then(|path| {
            self.adapter().rmdir(&path)?;
            Ok(path)
        });
        match result {
            Ok(path) => {
                self.inodes().remove_path(&path);
                reply.ok();
            }
            Err(e) => reply.error(errno("RMDIR", &name.to_string_lossy(), &e)),
        }
    }

    fn rename(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        if flags & libc::RENAME_EXCHANGE != 0 {
            return reply.error(libc::EINVAL);
        }
        let paths = self
            .child_path_of(parent, name)
            .and_then(|old| Ok((old, self.child_path_of(newparent, newname)?)));
        let (old, new) = match paths {
            Ok(paths) => paths,
            Err(e) => return reply.error(errno("RENAME", &name.to_string_lossy(), &e)),
        };

        let result = if flags & libc::RENAME_NOREPLACE != 0 {
            self.adapter().rename_no_replace(&old, &new)
        } else {
            self.adapter().rename(&old, &new)
        };
        match result {
            Ok(()) => {
                self.inodes().rename_path(&old, &new);
                reply.ok();
            }
            Err(e) => reply.error(errno("RENAME", &old, &e)),
        }
    }

    fn statfs(&mut self, _req: &Request, _ino: u64, reply: ReplyStatfs) {
        match self.adapter().statfs() {
            Ok(stats) => reply.statfs(
                stats.blocks,
                stats.blocks_free,
                stats.blocks_available,
                stats.files,
                stats.files_free,
                stats.block_size,
                stats.name_max,
                stats.fragment_size,
            ),
            Err(e) => reply.error(errno("STATFS", "/", &e)),
        }
    }
}
