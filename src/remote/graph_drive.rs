//! Microsoft Graph binding of the remote drive interface
//!
//! Graph is async (reqwest); the filesystem serves one call at a time on a
//! plain thread, so every operation is driven to completion on the tokio
//! runtime handle. Must not be called from inside an async task.

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::auth::graph_auth::GraphAuth;
use crate::remote::graph_models::{ChildrenPage, Drive, DriveItem};
use crate::remote::http_client::HttpClient;
use crate::remote::{ByteRange, ChildEntry, DriveNode, RemoteDrive, StorageUsage};

/// Page size requested when listing folder children
const CHILDREN_PAGE_SIZE: u32 = 200;

pub struct GraphDrive {
    http_client: HttpClient,
    auth: Arc<GraphAuth>,
    runtime: Handle,
    root: DriveNode,
}

impl GraphDrive {
    /// Fetches the drive root once and returns a drive bound to the
    /// authenticated session.
    pub fn connect(auth: Arc<GraphAuth>, runtime: Handle) -> Result<Self> {
        let http_client = HttpClient::new();
        let root_item: DriveItem = runtime
            .block_on(async {
                let auth_header = auth.auth_header().await?;
                http_client.get("/me/drive/root", &auth_header).await
            })
            .context("Failed to fetch drive root")?;
        info!("Connected to drive root (id {})", root_item.id);

        let mut root = root_item.to_node();
        root.name = String::new();
        Ok(Self {
            http_client,
            auth,
            runtime,
            root,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn item_url(item_id: &str) -> String {
        format!("/me/drive/items/{}", item_id)
    }

    fn child_url(parent_id: &str, name: &str) -> String {
        format!("/me/drive/items/{}:/{}", parent_id, urlencoding::encode(name))
    }

    fn children_url(folder_id: &str) -> String {
        format!(
            "/me/drive/items/{}/children?$select=name,folder&$top={}",
            folder_id, CHILDREN_PAGE_SIZE
        )
    }

    fn content_url(parent_id: &str, name: &str) -> String {
        format!(
            "/me/drive/items/{}:/{}:/content",
            parent_id,
            urlencoding::encode(name)
        )
    }
}

impl RemoteDrive for GraphDrive {
    fn root(&self) -> DriveNode {
        self.root.clone()
    }

    fn child(&self, parent: &DriveNode, name: &str) -> Result<Option<DriveNode>> {
        let url = Self::child_url(&parent.id, name);
        let item: Option<DriveItem> = self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client.get_optional(&url, &auth_header).await
        })?;
        Ok(item.map(|item| item.to_node()))
    }

    fn children(&self, folder: &DriveNode) -> Result<Vec<ChildEntry>> {
        self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            let mut entries = Vec::new();
            let mut next = Some(Self::children_url(&folder.id));
            while let Some(url) = next {
                let page: ChildrenPage = self
                    .http_client
                    .get(&url, &auth_header)
                    .await
                    .context("Failed to list children")?;
                entries.extend(page.value.into_iter().filter_map(|item| {
                    let is_folder = item.is_folder();
                    item.name.map(|name| ChildEntry { name, is_folder })
                }));
                next = page.next_link;
            }
            debug!("Listed {} children of {}", entries.len(), folder.id);
            Ok::<_, anyhow::Error>(entries)
        })
    }

    fn delete(&self, node: &DriveNode) -> Result<()> {
        self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .delete(&Self::item_url(&node.id), &auth_header)
                .await
                .context("Failed to delete item")
        })?;
        info!("Deleted item: {} ({})", node.name, node.id);
        Ok(())
    }

    fn rename(&self, node: &DriveNode, new_name: &str) -> Result<()> {
        let body = json!({ "name": new_name });
        self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .patch::<DriveItem, _>(&Self::item_url(&node.id), &body, &auth_header)
                .await
                .context("Failed to rename item")
        })?;
        info!("Renamed item: {} to: {}", node.id, new_name);
        Ok(())
    }

    fn move_to(&self, node: &DriveNode, new_parent: &DriveNode, new_name: &str) -> Result<()> {
        let body = json!({
            "name": new_name,
            "parentReference": { "id": new_parent.id },
        });
        self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .patch::<DriveItem, _>(&Self::item_url(&node.id), &body, &auth_header)
                .await
                .context("Failed to move item")
        })?;
        info!(
            "Moved item: {} to parent: {} as {}",
            node.id, new_parent.id, new_name
        );
        Ok(())
    }

    fn mkdir(&self, parent: &DriveNode, name: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail",
        });
        let url = format!("{}/children", Self::item_url(&parent.id));
        self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .post::<DriveItem, _>(&url, &body, &auth_header)
                .await
                .context("Failed to create folder")
        })?;
        info!("Created folder: {} in {}", name, parent.id);
        Ok(())
    }

    fn upload(&self, parent: &DriveNode, name: &str, content: &[u8]) -> Result<()> {
        let url = Self::content_url(&parent.id, name);
        let item: DriveItem = self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .upload_file(&url, content, &auth_header)
                .await
                .context("Failed to upload file")
        })?;
        info!(
            "Uploaded {} bytes as {} (id {})",
            content.len(),
            name,
            item.id
        );
        Ok(())
    }

    fn download(&self, node: &DriveNode, range: Option<ByteRange>) -> Result<Vec<u8>> {
        let url = format!("{}/content", Self::item_url(&node.id));
        self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .download_file(&url, range, &auth_header)
                .await
                .context("Failed to download file")
        })
    }

    fn storage_usage(&self) -> Result<StorageUsage> {
        let drive: Drive = self.block_on(async {
            let auth_header = self.auth.auth_header().await?;
            self.http_client
                .get("/me/drive", &auth_header)
                .await
                .context("Failed to fetch drive quota")
        })?;
        Ok(drive.storage_usage())
    }
}
