//! FUSE filesystem for a remote cloud drive
//!
//! `adapter` answers path-based requests against the remote drive;
//! `filesystem` and `operations` bind it to the inode-based kernel
//! interface.

pub mod adapter;
pub mod attributes;
pub mod cache;
pub mod directory;
pub mod file_operations;
pub mod filesystem;
pub mod inode;
pub mod mutations;
pub mod operations;
pub mod path_resolver;

pub use adapter::{DriveAdapter, VolumeStats};
pub use filesystem::CloudDriveFuse;
