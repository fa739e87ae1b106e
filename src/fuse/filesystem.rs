//! Kernel-facing filesystem and mount setup

use anyhow::{Context, Result};
use fuser::MountOption;
use log::{info, warn};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use crate::error::{FsError, FsResult};
use crate::fuse::adapter::DriveAdapter;
use crate::fuse::inode::InodeTable;
use crate::remote::RemoteDrive;

/// Cloud drive FUSE filesystem
pub struct CloudDriveFuse<D> {
    adapter: DriveAdapter<D>,
    inodes: InodeTable,
    attr_ttl: Duration,
}

impl<D: RemoteDrive> CloudDriveFuse<D> {
    /// `attr_ttl` is how long the kernel may reuse attributes and entries
    /// before asking again.
    pub fn new(adapter: DriveAdapter<D>, attr_ttl: Duration) -> Self {
        Self {
            adapter,
            inodes: InodeTable::new(),
            attr_ttl,
        }
    }

    pub fn adapter(&self) -> &DriveAdapter<D> {
        &self.adapter
    }

    pub(crate) fn inodes(&mut self) -> &mut InodeTable {
        &mut self.inodes
    }

    pub(crate) fn attr_ttl(&self) -> &Duration {
        &self.attr_ttl
    }

    pub(crate) fn path_of(&self, ino: u64) -> FsResult<String> {
        self.inodes
            .path(ino)
            .map(str::to_string)
            .ok_or_else(|| FsError::NotFound(format!("inode {}", ino)))
    }

    pub(crate) fn child_path_of(&self, parent: u64, name: &OsStr) -> FsResult<String> {
        let name = name
            .to_str()
            .ok_or_else(|| FsError::InvalidName(name.to_string_lossy().into_owned()))?;
        self.inodes
            .child_path(parent, name)
            .ok_or_else(|| FsError::NotFound(format!("inode {}", parent)))
    }
}

/// Mount options for a cloud drive mount
pub fn mount_options(allow_other: bool) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName("clouddrive".to_string()),
        MountOption::Subtype("clouddrive".to_string()),
        MountOption::DefaultPermissions,
        MountOption::NoAtime,
    ];
    if allow_other {
        options.push(MountOption::AllowOther);
    }
    options
}

/// Serves `filesystem` at `mountpoint` on the calling thread until it is
/// unmounted.
pub fn mount<D: RemoteDrive>(
    filesystem: CloudDriveFuse<D>,
    mountpoint: &Path,
    allow_other: bool,
) -> Result<()> {
    if !mountpoint.is_dir() {
        warn!("Mount point {} is not a directory", mountpoint.display());
    }
    info!("Mounting cloud drive at {}", mountpoint.display());
    fuser::mount2(filesystem, mountpoint, &mount_options(allow_other))
        .with_context(|| format!("Failed to mount at {}", mountpoint.display()))?;
    info!("Unmounted {}", mountpoint.display());
    Ok(())
}
