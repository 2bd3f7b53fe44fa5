use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// Attributes of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttrs {
    pub name: String,
    pub size: u64,
    /// URL the object's bytes can be fetched from.
    pub media_link: String,
}

/// Durable blob storage with a single bucket per store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fails if the configured bucket is missing or unreachable.
    async fn check_bucket(&self) -> StoreResult<()>;

    async fn put_object(
        &self,
        name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> StoreResult<ObjectAttrs>;

    /// Grant read access to everyone, making `media_link` fetchable without credentials.
    async fn set_public_read(&self, name: &str) -> StoreResult<()>;
}
