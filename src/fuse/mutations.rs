//! Tree mutations: unlink, rmdir, mkdir and rename

use log::{debug, info};

use crate::error::{FsError, FsResult};
use crate::fuse::adapter::DriveAdapter;
use crate::fuse::path_resolver::split_parent;
use crate::remote::{NodeKind, RemoteDrive};

impl<D: RemoteDrive> DriveAdapter<D> {
    /// Deletes the file at `path`. Folders are refused and left untouched.
    pub fn unlink(&self, path: &str) -> FsResult<()> {
        debug!("UNLINK: path={}", path);
        let node = self.resolve(path)?;
        if node.is_folder() {
            return Err(FsError::PermissionDenied(path.to_string()));
        }
        self.drive.delete(&node)?;
        Ok(())
    }

    /// Deletes the empty folder at `path`. Files are refused and left
    /// untouched.
    pub fn rmdir(&self, path: &str) -> FsResult<()> {
        debug!("RMDIR: path={}", path);
        if split_parent(path).is_none() {
            return Err(FsError::PermissionDenied(path.to_string()));
        }
        let node = self.resolve(path)?;
        match node.kind {
            NodeKind::File { .. } => Err(FsError::NotADirectory(path.to_string())),
            NodeKind::Folder { child_count } if child_count > 0 => {
                Err(FsError::NotEmpty(path.to_string()))
            }
            NodeKind::Folder { .. } => {
                self.drive.delete(&node)?;
                Ok(())
            }
        }
    }

    /// Creates a folder at `path`. The parent must be an existing folder.
    pub fn mkdir(&self, path: &str) -> FsResult<()> {
        debug!("MKDIR: path={}", path);
        let (parent, name) = self.resolver.resolve_parent_folder(&self.drive, path)?;
        if self.drive.child(&parent, name)?.is_some() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        self.drive.mkdir(&parent, name)?;
        Ok(())
    }

    /// Renames or moves the node at `old` to `new`, replacing an existing
    /// file at `new`.
    pub fn rename(&self, old: &str, new: &str) -> FsResult<()> {
        self.rename_node(old, new, true)
    }

    /// Like [`rename`](Self::rename) but fails with `AlreadyExists` when
    /// `new` is taken.
    pub fn rename_no_replace(&self, old: &str, new: &str) -> FsResult<()> {
        self.rename_node(old, new, false)
    }

    fn rename_node(&self, old: &str, new: &str, replace: bool) -> FsResult<()> {
        debug!("RENAME: {} -> {}", old, new);
        let (old_parent_path, old_name) =
            split_parent(old).ok_or_else(|| FsError::PermissionDenied(old.to_string()))?;
        let (new_parent_path, new_name) =
            split_parent(new).ok_or_else(|| FsError::PermissionDenied(new.to_string()))?;

        let old_parent = self.resolve(&old_parent_path)?;
        let node = self.resolver.lookup(&self.drive, &old_parent, old_name, old)?;

        let same_parent = old_parent_path == new_parent_path;
        let new_parent = if same_parent {
            old_parent
        } else {
            let parent = self.resolve(&new_parent_path)?;
            if !parent.is_folder() {
                return Err(FsError::NotADirectory(new_parent_path));
            }
            parent
        };

        if let Some(existing) = self.drive.child(&new_parent, new_name)? {
            if existing.id == node.id {
                if existing.name == new_name {
                    return Ok(());
                }
            } else if !replace {
                return Err(FsError::AlreadyExists(new.to_string()));
            } else if existing.is_folder() {
                return Err(FsError::AlreadyExists(new.to_string()));
            } else if node.is_folder() {
                return Err(FsError::NotADirectory(new.to_string()));
            } else {
                info!("Replacing {} with {}", new, old);
                self.drive.delete(&existing)?;
            }
        }

        if same_parent {
            self.drive.rename(&node, new_name)?;
        } else {
            self.drive.move_to(&node, &new_parent, new_name)?;
        }
        Ok(())
    }
}
