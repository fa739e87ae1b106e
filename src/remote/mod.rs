//! Remote drive service interface
//!
//! The filesystem core only talks to the drive through [`RemoteDrive`] and
//! [`Authenticator`]. Every call is synchronous and may be a network round
//! trip; implementations decide how to drive their transport.

pub mod graph_drive;
pub mod graph_models;
pub mod http_client;

use anyhow::Result;
use chrono::{DateTime, Utc};

/// Type of a remote node together with the fields that only make sense for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Folder { child_count: u64 },
    File { size: Option<u64> },
}

/// Optional timestamps reported by the remote service for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTimes {
    pub last_opened: Option<DateTime<Utc>>,
    pub changed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

/// A resolved reference to a node in the remote tree.
///
/// Handles are only valid for the call that obtained them; nothing keeps
/// them across filesystem operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveNode {
    /// Opaque id the remote service uses to address the node
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub times: NodeTimes,
}

impl DriveNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Reported content size, `None` for folders and files without one.
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            NodeKind::File { size } => size,
            NodeKind::Folder { .. } => None,
        }
    }
}

/// Inclusive byte span for a ranged content download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Span covering `size` bytes starting at `offset`. `None` when `size` is 0.
    pub fn from_offset_size(offset: u64, size: u64) -> Option<Self> {
        if size == 0 {
            return None;
        }
        Some(Self {
            start: offset,
            end: offset.saturating_add(size - 1),
        })
    }

    /// Value for an HTTP `Range` header
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub is_folder: bool,
}

/// Account level storage figures, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Tree and content operations offered by the remote drive.
pub trait RemoteDrive {
    /// Handle of the drive root. Never requires a remote call.
    fn root(&self) -> DriveNode;

    /// Looks up a direct child of `parent` by name. `Ok(None)` when absent.
    fn child(&self, parent: &DriveNode, name: &str) -> Result<Option<DriveNode>>;

    /// Direct children of a folder, in the service's order.
    fn children(&self, folder: &DriveNode) -> Result<Vec<ChildEntry>>;

    fn delete(&self, node: &DriveNode) -> Result<()>;

    /// Changes the node's name within its current parent.
    fn rename(&self, node: &DriveNode, new_name: &str) -> Result<()>;

    /// Moves the node under `new_parent`, naming it `new_name`.
    fn move_to(&self, node: &DriveNode, new_parent: &DriveNode, new_name: &str) -> Result<()>;

    fn mkdir(&self, parent: &DriveNode, name: &str) -> Result<()>;

    /// Stores `content` as the whole content of `parent/name`, replacing any
    /// existing file of that name.
    fn upload(&self, parent: &DriveNode, name: &str, content: &[u8]) -> Result<()>;

    /// Downloads the node's content, optionally restricted to `range`.
    fn download(&self, node: &DriveNode, range: Option<ByteRange>) -> Result<Vec<u8>>;

    fn storage_usage(&self) -> Result<StorageUsage>;
}

/// Login credentials loaded from the local credentials store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Result of the first authentication step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Session is ready to serve requests
    Authenticated,
    /// A second factor is required; `prompt` tells the user where to get the code
    ChallengeRequired { prompt: String },
}

/// Authentication handshake of the remote service.
pub trait Authenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<LoginOutcome>;

    /// Validates the second-factor code. `Ok(false)` when it was rejected.
    fn validate_challenge(&self, code: &str) -> Result<bool>;
}
