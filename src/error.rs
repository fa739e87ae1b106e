//! Filesystem error kinds and their errno mapping

use thiserror::Error;

/// Failure kinds surfaced by the drive adapter.
///
/// Every variant maps to exactly one errno; anything the remote client
/// reports that is not classified here ends up as `Remote` (EIO).
#[derive(Debug, Error)]
pub enum FsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Operation not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Remote service error: {0:#}")]
    Remote(#[from] anyhow::Error),
}

impl FsError {
    /// Converts this error to a libc error code for FUSE.
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::PermissionDenied(_) => libc::EACCES,
            FsError::NotImplemented(_) => libc::ENOSYS,
            FsError::NotEmpty(_) => libc::ENOTEMPTY,
            FsError::AlreadyExists(_) => libc::EEXIST,
            FsError::InvalidName(_) => libc::EINVAL,
            FsError::Remote(_) => libc::EIO,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

/// Result type for adapter operations.
pub type FsResult<T> = Result<T, FsError>;
