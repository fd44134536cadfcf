//! Types for object storage

use serde::{Deserialize, Serialize};

/// A stored object as reported by the storage service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    /// Object name (the storage key)
    #[serde(rename = "Key", alias = "name")]
    pub key: String,

    /// Object id, when the service reports one
    pub id: Option<String>,

    /// Last update time
    pub updated_at: Option<String>,

    /// Creation time
    pub created_at: Option<String>,

    /// Object metadata
    pub metadata: Option<serde_json::Value>,
}

/// Options for uploading an object
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// Content type of the upload
    pub content_type: Option<String>,

    /// Cache-Control header value in seconds
    pub cache_control: Option<String>,

    /// Whether to overwrite an existing object at the same key
    pub upsert: bool,
}

impl FileOptions {
    /// Create empty upload options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Set the cache control value
    pub fn with_cache_control(mut self, cache_control: &str) -> Self {
        self.cache_control = Some(cache_control.to_string());
        self
    }

    /// Allow overwriting an existing object
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Options for listing objects
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Maximum number of objects to return
    pub limit: Option<i32>,

    /// Number of objects to skip
    pub offset: Option<i32>,
}
