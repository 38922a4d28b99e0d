//! Attachment upload orchestration.

use crate::task::ports::{AttachmentUpload, AttachmentUrl, BlobStore, BlobStoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors for attachment uploads.
#[derive(Debug, Clone, Error)]
pub enum AttachmentError {
    /// No files were selected for upload.
    #[error("no files were selected for upload")]
    NoFiles,

    /// The blob store failed to take the upload.
    #[error(transparent)]
    Store(#[from] BlobStoreError),
}

/// Uploads task attachments through a blob store.
#[derive(Clone)]
pub struct AttachmentService<B: BlobStore> {
    store: Arc<B>,
}

impl<B: BlobStore> AttachmentService<B> {
    /// Creates an attachment service over a blob store.
    #[must_use]
    pub const fn new(store: Arc<B>) -> Self {
        Self { store }
    }

    /// Uploads the file set and returns its content-addressed URL.
    ///
    /// An empty file set is rejected locally without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::NoFiles`] on an empty set and
    /// [`AttachmentError::Store`] when the store fails.
    pub async fn upload(&self, files: &[AttachmentUpload]) -> Result<AttachmentUrl, AttachmentError> {
        if files.is_empty() {
            return Err(AttachmentError::NoFiles);
        }
        let url = self.store.upload(files).await?;
        info!(url = %url, count = files.len(), "attachments uploaded");
        Ok(url)
    }
}
