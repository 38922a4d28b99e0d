//! Content-addressed in-memory blob store.

use crate::task::ports::{AttachmentUpload, AttachmentUrl, BlobStore, BlobStoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// In-memory blob store addressing each upload set by a SHA-256 digest of
/// its content.
///
/// Uploading the same file set twice yields the same URL, as any
/// content-addressed store would.
#[derive(Debug)]
pub struct InMemoryBlobStore {
    host: String,
    objects: RwLock<HashMap<String, Vec<AttachmentUpload>>>,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlobStore {
    /// Gateway host used in minted URLs when none is given.
    pub const DEFAULT_HOST: &'static str = "blobs.agora.test";

    /// Creates a store minting URLs under the default gateway host.
    #[must_use]
    pub fn new() -> Self {
        Self::with_host(Self::DEFAULT_HOST)
    }

    /// Creates a store minting URLs under the given gateway host.
    #[must_use]
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the stored file set for a content digest, if present.
    #[must_use]
    pub fn get(&self, digest: &str) -> Option<Vec<AttachmentUpload>> {
        self.objects.read().get(digest).cloned()
    }

    fn digest(files: &[AttachmentUpload]) -> String {
        let mut hasher = Sha256::new();
        for file in files {
            hasher.update(file.file_name.as_bytes());
            hasher.update([0]);
            hasher.update(&file.content);
            hasher.update([0]);
        }
        let mut out = String::with_capacity(64);
        for byte in hasher.finalize() {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, files: &[AttachmentUpload]) -> Result<AttachmentUrl, BlobStoreError> {
        if files.is_empty() {
            return Err(BlobStoreError::new());
        }
        let digest = Self::digest(files);
        let url = AttachmentUrl::new(format!("https://{digest}.{}", self.host));
        self.objects.write().insert(digest, files.to_vec());
        Ok(url)
    }
}
