//! Object storage for listing photos

mod types;

use reqwest::{multipart, Client};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::Error;
use crate::fetch::{Fetch, CLIENT_INFO};

pub use types::*;

/// Client for the object storage service
pub struct StorageClient {
    /// The base URL for the project
    url: String,

    /// The anonymous API key for the project
    key: String,

    /// HTTP client used for requests
    client: Client,
}

/// Client for a specific storage bucket
pub struct BucketClient<'a> {
    /// Reference to the storage client
    storage: &'a StorageClient,

    /// The bucket ID
    bucket_id: String,
}

impl StorageClient {
    /// Create a new StorageClient
    pub(crate) fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
        }
    }

    /// Get the base URL for storage operations
    fn get_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> BucketClient {
        BucketClient {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl<'a> BucketClient<'a> {
    /// Upload an object to the bucket
    pub async fn upload(
        &self,
        path: &str,
        file_data: Vec<u8>,
        options: FileOptions,
    ) -> Result<FileObject, Error> {
        let url = self
            .storage
            .get_url(&format!("/object/{}/{}", self.bucket_id, path));

        let file_name = Path::new(path)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let mut part = multipart::Part::bytes(file_data).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| Error::storage(format!("invalid content type: {}", e)))?;
        }
        let form = multipart::Form::new().part("file", part);

        debug!(bucket = %self.bucket_id, path, "uploading object");
        let response = self
            .storage
            .client
            .post(&url)
            .header("apikey", &self.storage.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header(
                "Cache-Control",
                options.cache_control.unwrap_or_else(|| "3600".to_string()),
            )
            .header("x-upsert", options.upsert.to_string())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::storage(format!(
                "upload failed with status {}: {}",
                status, text
            )));
        }

        let file_object = response.json::<FileObject>().await?;
        Ok(file_object)
    }

    /// Download an object from the bucket
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, Error> {
        let url = self
            .storage
            .get_url(&format!("/object/{}/{}", self.bucket_id, path));

        let response = Fetch::get(&self.storage.client, &url)
            .apikey(&self.storage.key)
            .execute_raw()
            .await?;

        if !response.status().is_success() {
            return Err(Error::storage(format!(
                "download failed with status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// List objects in the bucket under a prefix
    pub async fn list(
        &self,
        prefix: Option<&str>,
        options: ListOptions,
    ) -> Result<Vec<FileObject>, Error> {
        let url = self
            .storage
            .get_url(&format!("/object/list/{}", self.bucket_id));

        let mut params = HashMap::new();
        if let Some(prefix) = prefix {
            params.insert("prefix".to_string(), prefix.to_string());
        }
        if let Some(limit) = options.limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        if let Some(offset) = options.offset {
            params.insert("offset".to_string(), offset.to_string());
        }

        let files = Fetch::get(&self.storage.client, &url)
            .apikey(&self.storage.key)
            .query(params)
            .execute::<Vec<FileObject>>()
            .await?;

        Ok(files)
    }

    /// Remove objects from the bucket
    pub async fn remove(&self, paths: &[&str]) -> Result<(), Error> {
        let url = self.storage.get_url(&format!("/object/{}", self.bucket_id));

        let body = serde_json::json!({ "prefixes": paths });

        let response = Fetch::delete(&self.storage.client, &url)
            .apikey(&self.storage.key)
            .json(&body)?
            .execute_raw()
            .await?;

        if !response.status().is_success() {
            return Err(Error::storage(format!(
                "remove failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// The public URL for an object in a public bucket
    pub fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.storage.url, self.bucket_id, path
        )
    }
}
