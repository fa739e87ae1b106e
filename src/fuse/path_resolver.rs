//! Path splitting and resolution against the remote tree
//!
//! Nothing is cached here: every resolution walks the tree from the root,
//! one child lookup per segment.

use log::{debug, trace};

use crate::error::{FsError, FsResult};
use crate::remote::{DriveNode, RemoteDrive};

/// Splits an absolute path into its name segments. Root is the empty list;
/// repeated and trailing separators never produce empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Splits a path into its parent path and final name.
/// `None` for the root, which has neither.
pub fn split_parent(path: &str) -> Option<(String, &str)> {
    let mut segments = split_path(path);
    let name = segments.pop()?;
    Some((format!("/{}", segments.join("/")), name))
}

/// Joins a parent path and a child name into a normalized absolute path
pub fn join_path(parent: &str, name: &str) -> String {
    let segments = split_path(parent);
    if segments.is_empty() {
        format!("/{}", name)
    } else {
        format!("/{}/{}", segments.join("/"), name)
    }
}

/// Resolves paths to remote node handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathResolver;

impl PathResolver {
    pub fn new() -> Self {
        Self
    }

    /// Walks `path` from the drive root. Fails with `NotFound` at the first
    /// missing segment; transport failures surface as `Remote`.
    pub fn resolve<D>(&self, drive: &D, path: &str) -> FsResult<DriveNode>
    where
        D: RemoteDrive + ?Sized,
    {
        let mut node = drive.root();
        let mut walked = String::new();
        for segment in split_path(path) {
            walked.push('/');
            walked.push_str(segment);
            node = self.lookup(drive, &node, segment, &walked)?;
        }
        trace!("Resolved {} to {}", path, node.id);
        Ok(node)
    }

    /// Looks up a single child. `path` is only used for error reporting.
    pub fn lookup<D>(&self, drive: &D, parent: &DriveNode, name: &str, path: &str) -> FsResult<DriveNode>
    where
        D: RemoteDrive + ?Sized,
    {
        match drive.child(parent, name)? {
            Some(child) => Ok(child),
            None => {
                debug!("Path segment not found: {}", path);
                Err(FsError::NotFound(path.to_string()))
            }
        }
    }

    /// Resolves the parent of `path` and requires it to be a folder.
    /// Returns the folder handle and the final name.
    pub fn resolve_parent_folder<'p, D>(&self, drive: &D, path: &'p str) -> FsResult<(DriveNode, &'p str)>
    where
        D: RemoteDrive + ?Sized,
    {
        let (parent_path, name) =
            split_parent(path).ok_or_else(|| FsError::InvalidName(path.to_string()))?;
        let parent = self.resolve(drive, &parent_path)?;
        if !parent.is_folder() {
            return Err(FsError::NotADirectory(parent_path));
        }
        Ok((parent, name))
    }
}
