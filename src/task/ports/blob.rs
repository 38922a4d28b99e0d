//! Blob storage port for task attachments.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    /// File name as presented to downloaders.
    pub file_name: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl AttachmentUpload {
    /// Creates an upload from a file name and its content.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Content-addressed URL of an uploaded attachment set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentUrl(String);

impl AttachmentUrl {
    /// Wraps a URL returned by a blob store.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned by blob store implementations.
///
/// Upload failures are deliberately opaque: the store is an external
/// service and callers only need the single failed-to-upload condition.
#[derive(Debug, Clone, Error)]
#[error("attachment upload failed")]
pub struct BlobStoreError {
    cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl BlobStoreError {
    /// Builds an upload failure without an underlying cause.
    #[must_use]
    pub const fn new() -> Self {
        Self { cause: None }
    }

    /// Builds an upload failure wrapping an underlying cause.
    pub fn with_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            cause: Some(Arc::new(err)),
        }
    }

    /// Returns the underlying cause, if one was recorded.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        self.cause.as_deref()
    }
}

impl Default for BlobStoreError {
    fn default() -> Self {
        Self::new()
    }
}

/// Store-by-content-hash service for task attachments.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the files and returns the content-addressed URL.
    async fn upload(&self, files: &[AttachmentUpload]) -> Result<AttachmentUrl, BlobStoreError>;
}
