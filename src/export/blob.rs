//! In-memory blobs and transient object URLs

use super::types::{ExportError, ExportResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// An immutable byte payload with a claimed content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content_type: String,
    data: Arc<[u8]>,
}

impl Blob {
    /// Concatenate chunks in order
    pub fn from_chunks<C: AsRef<[u8]>>(chunks: &[C], content_type: impl Into<String>) -> Self {
        let total = chunks.iter().map(|c| c.as_ref().len()).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(chunk.as_ref());
        }
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A `blob:` URL referring to a registered blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of live object URLs
///
/// Every URL handed out holds its blob in memory until revoked.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    urls: Mutex<HashMap<ObjectUrl, Blob>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, blob: Blob) -> ObjectUrl {
        let url = ObjectUrl(format!("blob:screen-recorder/{}", Uuid::new_v4()));
        tracing::trace!("Created object URL {} ({} bytes)", url, blob.len());
        self.urls.lock().insert(url.clone(), blob);
        url
    }

    pub fn resolve(&self, url: &ObjectUrl) -> ExportResult<Blob> {
        self.urls
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| ExportError::UnknownObjectUrl(url.to_string()))
    }

    /// Release a URL. Returns false if it was not registered.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.urls.lock().remove(url).is_some();
        if removed {
            tracing::trace!("Revoked object URL {}", url);
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.urls.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_concatenates_in_order() {
        let blob = Blob::from_chunks(&[vec![1u8, 2], vec![3u8], vec![4u8, 5]], "video/webm");
        assert_eq!(blob.bytes(), &[1, 2, 3, 4, 5]);
        assert_eq!(blob.content_type(), "video/webm");
    }

    #[test]
    fn test_registry_lifecycle() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create(Blob::from_chunks(&[b"abc"], "video/webm"));
        assert!(url.as_str().starts_with("blob:"));
        assert_eq!(registry.resolve(&url).unwrap().bytes(), b"abc");
        assert_eq!(registry.live_count(), 1);

        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert_eq!(registry.live_count(), 0);
        assert!(matches!(
            registry.resolve(&url),
            Err(ExportError::UnknownObjectUrl(_))
        ));
    }
}
