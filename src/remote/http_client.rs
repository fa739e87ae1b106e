use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::remote::ByteRange;

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// HTTP client for Microsoft Graph drive operations
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Get full URL by prepending Graph API base if needed
    pub fn get_full_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", GRAPH_API_BASE, url)
        }
    }

    /// Make a GET request with authorization header
    pub async fn get<T>(&self, url: &str, auth_header: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.get_full_url(url);
        debug!("Getting url: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header)
            .send()
            .await
            .context("Failed to get response")?
            .error_for_status()
            .context("Not a success status")?;

        let response_json = response
            .json::<T>()
            .await
            .context("Failed to deserialize response to type T")?;
        Ok(response_json)
    }

    /// GET that treats 404 as an absent resource instead of an error
    pub async fn get_optional<T>(&self, url: &str, auth_header: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.get_full_url(url);
        debug!("Looking up url: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header)
            .send()
            .await
            .context("Failed to get response")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let item = response
            .error_for_status()
            .context("Not a success status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response to type T")?;
        Ok(Some(item))
    }

    /// Make a POST request with authorization header
    pub async fn post<T, B>(&self, url: &str, body: &B, auth_header: &str) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let url = self.get_full_url(url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", auth_header)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .context("Failed to get response for post")?
            .error_for_status()
            .context("Not a success status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response to type T")?;
        Ok(response)
    }

    /// Make a PATCH request with authorization header
    pub async fn patch<T, B>(&self, url: &str, body: &B, auth_header: &str) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let url = self.get_full_url(url);
        let response = self
            .client
            .patch(&url)
            .header("Authorization", auth_header)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .context("Failed to get response for patch")?
            .error_for_status()
            .context("Not a success status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response to type T")?;
        Ok(response)
    }

    /// Make a DELETE request with authorization header
    pub async fn delete(&self, url: &str, auth_header: &str) -> Result<()> {
        let url = self.get_full_url(url);
        self.client
            .delete(&url)
            .header("Authorization", auth_header)
            .send()
            .await
            .context("Failed to get response for delete")?
            .error_for_status()
            .context("Not a success status")?;
        Ok(())
    }

    /// Upload file content with authorization header
    pub async fn upload_file<T>(&self, url: &str, file_data: &[u8], auth_header: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.get_full_url(url);
        let response = self
            .client
            .put(&url)
            .header("Authorization", auth_header)
            .header("Content-Type", "application/octet-stream")
            .body(file_data.to_vec())
            .send()
            .await
            .context("Failed to get response for upload")?
            .error_for_status()
            .context("Not a success status")?
            .json::<T>()
            .await
            .context("Failed to deserialize upload response")?;
        Ok(response)
    }

    /// Download file content, optionally restricted to an inclusive byte range.
    /// A range that starts past the end of the content yields no bytes.
    pub async fn download_file(
        &self,
        url: &str,
        range: Option<ByteRange>,
        auth_header: &str,
    ) -> Result<Vec<u8>> {
        let url = self.get_full_url(url);
        let mut request = self.client.get(&url).header("Authorization", auth_header);
        if let Some(range) = range {
            request = request.header("Range", range.header_value());
        }

        let response = request
            .send()
            .await
            .context("Failed to get response for download")?;

        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            debug!("Range {:?} not satisfiable for {}", range, url);
            return Ok(Vec::new());
        }

        let bytes = response
            .error_for_status()
            .context("Not a success status")?
            .bytes()
            .await
            .context("Failed to read download body")?;
        Ok(bytes.to_vec())
    }
}
