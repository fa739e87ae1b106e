//! Inode numbers for kernel-facing paths
//!
//! The kernel addresses nodes by inode; the adapter works on paths. This
//! table only remembers which path an inode stands for, never a remote
//! handle, so every request still resolves from the root.

use std::collections::HashMap;

use crate::fuse::path_resolver::join_path;

pub const ROOT_INO: u64 = 1;

/// Placeholder `d_ino` for directory entries the kernel has not looked up
pub const UNKNOWN_INO: u64 = 0xffff_ffff;

#[derive(Debug)]
pub struct InodeTable {
    paths: HashMap<u64, String>,
    inodes: HashMap<String, u64>,
    /// Outstanding kernel lookups per inode
    lookups: HashMap<u64, u64>,
    next_ino: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            paths: HashMap::new(),
            inodes: HashMap::new(),
            lookups: HashMap::new(),
            next_ino: ROOT_INO + 1,
        };
        table.paths.insert(ROOT_INO, "/".to_string());
        table.inodes.insert("/".to_string(), ROOT_INO);
        table
    }

    pub fn path(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    pub fn ino(&self, path: &str) -> Option<u64> {
        self.inodes.get(path).copied()
    }

    /// Path of `name` inside the directory `parent`
    pub fn child_path(&self, parent: u64, name: &str) -> Option<String> {
        self.path(parent).map(|p| join_path(p, name))
    }

    /// Inode of the directory containing `ino`; root is its own parent.
    pub fn parent_ino(&self, ino: u64) -> u64 {
        self.path(ino)
            .and_then(|path| path.rfind('/').map(|i| &path[..i]))
            .map(|parent| if parent.is_empty() { "/" } else { parent })
            .and_then(|parent| self.ino(parent))
            .unwrap_or(ROOT_INO)
    }

    /// Inode for `path`, allocating one if the path is new.
    pub fn get_or_insert(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.ino(path) {
            return ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.paths.insert(ino, path.to_string());
        self.inodes.insert(path.to_string(), ino);
        ino
    }

    /// Inode to report for `path` in a directory listing. Listings take no
    /// kernel reference, so unknown paths get [`UNKNOWN_INO`] instead of an
    /// allocation.
    pub fn listing_ino(&self, path: &str) -> u64 {
        self.ino(path).unwrap_or(UNKNOWN_INO)
    }

    /// Like [`get_or_insert`](Self::get_or_insert), counting one kernel
    /// reference to the returned inode.
    pub fn lookup(&mut self, path: &str) -> u64 {
        let ino = self.get_or_insert(path);
        *self.lookups.entry(ino).or_insert(0) += 1;
        ino
    }

    /// Drops `nlookup` kernel references; the inode is released once none
    /// remain.
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if ino == ROOT_INO {
            return;
        }
        let remaining = match self.lookups.get_mut(&ino) {
            Some(count) => {
                *count = count.saturating_sub(nlookup);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.lookups.remove(&ino);
            if let Some(path) = self.paths.remove(&ino) {
                self.inodes.remove(&path);
            }
        }
    }

    /// Forgets `path` and everything below it.
    pub fn remove_path(&mut self, path: &str) {
        let prefix = format!("{}/", path);
        let doomed: Vec<String> = self
            .inodes
            .keys()
            .filter(|p| p.as_str() == path || p.starts_with(&prefix))
            .cloned()
            .collect();
        for p in doomed {
            if let Some(ino) = self.inodes.remove(&p) {
                self.paths.remove(&ino);
                self.lookups.remove(&ino);
            }
        }
    }

    /// Re-keys `old` and its descendants under `new`, keeping their inodes.
    /// Whatever was known at `new` is dropped first.
    pub fn rename_path(&mut self, old: &str, new: &str) {
        self.remove_path(new);
        let prefix = format!("{}/", old);
        let moved: Vec<(String, u64)> = self
            .inodes
            .iter()
            .filter(|(p, _)| p.as_str() == old || p.starts_with(&prefix))
            .map(|(p, ino)| (p.clone(), *ino))
            .collect();
        for (p, ino) in moved {
            let renamed = format!("{}{}", new, &p[old.len()..]);
            self.inodes.remove(&p);
            self.inodes.insert(renamed.clone(), ino);
            self.paths.insert(ino, renamed);
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
