//! Directory listing

use std::vec;

use crate::error::{FsError, FsResult};
use crate::remote::{ChildEntry, DriveNode, RemoteDrive};

/// One name yielded by a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    fn dot(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
        }
    }
}

impl From<ChildEntry> for DirEntry {
    fn from(entry: ChildEntry) -> Self {
        Self {
            name: entry.name,
            is_dir: entry.is_folder,
        }
    }
}

/// `.` and `..` followed by the folder's children in the service's order.
/// Built fresh for every listing request.
#[derive(Debug)]
pub struct DirectoryListing {
    dots: vec::IntoIter<DirEntry>,
    children: vec::IntoIter<ChildEntry>,
}

impl DirectoryListing {
    /// Lists `folder`. One remote enumeration per call.
    pub fn list<D>(drive: &D, folder: &DriveNode, path: &str) -> FsResult<Self>
    where
        D: RemoteDrive + ?Sized,
    {
        if !folder.is_folder() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        let children = drive.children(folder)?;
        Ok(Self {
            dots: vec![DirEntry::dot("."), DirEntry::dot("..")].into_iter(),
            children: children.into_iter(),
        })
    }

    /// Just the names, in listing order
    pub fn names(self) -> Vec<String> {
        self.map(|entry| entry.name).collect()
    }
}

impl Iterator for DirectoryListing {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        self.dots
            .next()
            .or_else(|| self.children.next().map(DirEntry::from))
    }
}
