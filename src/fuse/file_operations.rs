//! Content I/O: create, whole-file write, ranged read and truncate

use log::debug;

use crate::error::{FsError, FsResult};
use crate::fuse::adapter::DriveAdapter;
use crate::remote::{ByteRange, RemoteDrive};

impl<D: RemoteDrive> DriveAdapter<D> {
    /// Creates an empty file at `path` by uploading zero bytes.
    pub fn create(&self, path: &str) -> FsResult<()> {
        debug!("CREATE: path={}", path);
        let (parent, name) = self.resolver.resolve_parent_folder(&self.drive, path)?;
        self.drive.upload(&parent, name, &[])?;
        Ok(())
    }

    /// Replaces the whole content of `path` with `data`.
    ///
    /// Only writes at offset 0 are supported; anything else is rejected
    /// before contacting the service.
    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> FsResult<usize> {
        debug!("WRITE: path={}, offset={}, size={}", path, offset, data.len());
        if offset != 0 {
            return Err(FsError::NotImplemented("write at non-zero offset"));
        }
        let (parent, name) = self.resolver.resolve_parent_folder(&self.drive, path)?;
        self.drive.upload(&parent, name, data)?;
        Ok(data.len())
    }

    /// Reads up to `size` bytes starting at `offset`. Short or empty at end
    /// of file.
    pub fn read(&self, path: &str, size: u64, offset: u64) -> FsResult<Vec<u8>> {
        debug!("READ: path={}, offset={}, size={}", path, offset, size);
        let node = self.resolve(path)?;
        if node.is_folder() {
            return Err(FsError::IsADirectory(path.to_string()));
        }

        let range = match ByteRange::from_offset_size(offset, size) {
            Some(range) => range,
            None => return Ok(Vec::new()),
        };
        if node.size().is_some_and(|file_size| offset >= file_size) {
            return Ok(Vec::new());
        }

        let mut data = self.drive.download(&node, Some(range))?;
        if data.len() as u64 > size {
            data.truncate(size as usize);
        }
        Ok(data)
    }

    /// Sets the length of the file at `path`. Only emptying a file, or a
    /// no-op resize to its current length, is supported.
    pub fn truncate(&self, path: &str, size: u64) -> FsResult<()> {
        debug!("TRUNCATE: path={}, size={}", path, size);
        let node = self.resolve(path)?;
        if node.is_folder() {
            return Err(FsError::IsADirectory(path.to_string()));
        }
        if node.size() == Some(size) {
            return Ok(());
        }
        if size != 0 {
            return Err(FsError::NotImplemented("truncate to non-zero length"));
        }
        let (parent, name) = self.resolver.resolve_parent_folder(&self.drive, path)?;
        self.drive.upload(&parent, name, &[])?;
        Ok(())
    }
}
