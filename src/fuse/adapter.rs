//! Path-based filesystem adapter over a remote drive
//!
//! Every operation starts from a path and re-resolves it against the remote
//! tree. The only state kept between calls is the volume statistics cache.

use log::debug;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::FsResult;
use crate::fuse::attributes::{AttributeSynthesizer, FileAttributes};
use crate::fuse::cache::TtlCache;
use crate::fuse::directory::DirectoryListing;
use crate::fuse::path_resolver::PathResolver;
use crate::remote::{DriveNode, RemoteDrive, StorageUsage};

/// Cache key of the volume statistics entry
pub const STATFS_CACHE_KEY: &str = "statvfs";

/// Preferred I/O block size reported to statfs callers
const STATFS_BLOCK_SIZE: u32 = 1024 * 1024;

/// Unit of the block counts reported to statfs callers
const STATFS_FRAGMENT_SIZE: u32 = 4096;

const NAME_MAX: u32 = 255;

/// Filesystem statistics as reported by statfs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeStats {
    pub block_size: u32,
    pub fragment_size: u32,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
    pub name_max: u32,
}

impl From<StorageUsage> for VolumeStats {
    fn from(usage: StorageUsage) -> Self {
        let fragment = u64::from(STATFS_FRAGMENT_SIZE);
        let free = usage.available_bytes / fragment;
        Self {
            block_size: STATFS_BLOCK_SIZE,
            fragment_size: STATFS_FRAGMENT_SIZE,
            blocks: usage.total_bytes / fragment,
            blocks_free: free,
            blocks_available: free,
            files: 0,
            files_free: 0,
            name_max: NAME_MAX,
        }
    }
}

/// Answers filesystem requests by path against a remote drive.
pub struct DriveAdapter<D> {
    pub(crate) drive: D,
    pub(crate) resolver: PathResolver,
    attributes: AttributeSynthesizer,
    stats_cache: TtlCache<String, VolumeStats>,
}

impl<D: RemoteDrive> DriveAdapter<D> {
    /// Adapter owned by the current process user, caching per `cache_config`.
    pub fn new(drive: D, cache_config: &CacheConfig) -> Self {
        Self::with_parts(
            drive,
            AttributeSynthesizer::for_current_process(),
            cache_config.statfs_ttl,
            cache_config.capacity,
        )
    }

    pub fn with_parts(
        drive: D,
        attributes: AttributeSynthesizer,
        stats_ttl: Duration,
        cache_capacity: usize,
    ) -> Self {
        Self {
            drive,
            resolver: PathResolver::new(),
            attributes,
            stats_cache: TtlCache::new(stats_ttl, cache_capacity),
        }
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn resolve(&self, path: &str) -> FsResult<DriveNode> {
        self.resolver.resolve(&self.drive, path)
    }

    /// Attributes of the node at `path`, fetched fresh from the service.
    pub fn getattr(&self, path: &str) -> FsResult<FileAttributes> {
        debug!("GETATTR: path={}", path);
        let node = self.resolve(path)?;
        Ok(self.attributes.synthesize(&node))
    }

    /// Volume statistics. Served from cache while fresh; a miss costs one
    /// quota lookup.
    pub fn statfs(&self) -> FsResult<VolumeStats> {
        debug!("STATFS");
        self.stats_cache
            .get_or_try_insert_with(STATFS_CACHE_KEY.to_string(), || {
                let usage = self.drive.storage_usage()?;
                debug!(
                    "Storage usage: total={} available={}",
                    usage.total_bytes, usage.available_bytes
                );
                Ok(VolumeStats::from(usage))
            })
    }

    /// `.`, `..` and the names of the folder's children.
    pub fn readdir(&self, path: &str) -> FsResult<DirectoryListing> {
        debug!("READDIR: path={}", path);
        let folder = self.resolve(path)?;
        DirectoryListing::list(&self.drive, &folder, path)
    }
}
