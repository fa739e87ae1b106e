use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::remote::{DriveNode, NodeKind, NodeTimes, StorageUsage};

/// ParentReference: the folder a drive item lives in.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct ParentReference {
    #[serde(default)]
    pub id: String,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct FolderFacet {
    #[serde(rename = "childCount", default)]
    pub child_count: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct FileFacet {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// Client-side timestamps as reported by the device that wrote the item.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct FileSystemInfo {
    #[serde(rename = "createdDateTime")]
    pub created: Option<String>,
    #[serde(rename = "lastModifiedDateTime")]
    pub last_modified: Option<String>,
    #[serde(rename = "lastAccessedDateTime")]
    pub last_accessed: Option<String>,
}

/// DriveItem: metadata of a file or folder.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DriveItem {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "lastModifiedDateTime")]
    pub last_modified: Option<String>,
    #[serde(rename = "createdDateTime")]
    pub created_date: Option<String>,
    pub size: Option<u64>,
    pub folder: Option<FolderFacet>,
    pub file: Option<FileFacet>,
    #[serde(rename = "fileSystemInfo")]
    pub file_system_info: Option<FileSystemInfo>,
    #[serde(rename = "parentReference")]
    pub parent_reference: Option<ParentReference>,
}

fn parse_time(value: Option<&String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    /// Converts the Graph representation into the service-neutral node handle.
    /// Items without a folder facet are treated as files.
    pub fn to_node(&self) -> DriveNode {
        let kind = match &self.folder {
            Some(folder) => NodeKind::Folder {
                child_count: folder.child_count,
            },
            None => NodeKind::File { size: self.size },
        };

        let fs_info = self.file_system_info.as_ref();
        let times = NodeTimes {
            last_opened: parse_time(fs_info.and_then(|i| i.last_accessed.as_ref())),
            changed: parse_time(self.last_modified.as_ref()),
            modified: parse_time(
                fs_info
                    .and_then(|i| i.last_modified.as_ref())
                    .or(self.last_modified.as_ref()),
            ),
            created: parse_time(
                self.created_date
                    .as_ref()
                    .or(fs_info.and_then(|i| i.created.as_ref())),
            ),
        };

        DriveNode {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_default(),
            kind,
            times,
        }
    }
}

/// One page of a folder listing
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ChildrenPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Quota {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub remaining: u64,
    #[serde(default)]
    pub used: u64,
}

/// Drive resource, only the quota facet is used.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Drive {
    #[serde(default)]
    pub id: String,
    pub quota: Option<Quota>,
}

impl Drive {
    pub fn storage_usage(&self) -> StorageUsage {
        let quota = self.quota.clone().unwrap_or_default();
        StorageUsage {
            total_bytes: quota.total,
            available_bytes: quota.remaining,
        }
    }
}
