//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use fragments_core::{FragmentId, FragmentRecord, OwnerId};

/// Persistence for fragment metadata and raw data.
///
/// Two logical namespaces, both keyed by `(owner, id)`. Each key is an
/// independently consistent unit: implementations provide per-key
/// atomicity, and nothing spans keys. Concurrent writers to the same key
/// resolve as last write wins.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Insert or replace a record's metadata.
    async fn put_metadata(&self, record: &FragmentRecord) -> StorageResult<()>;

    /// Fetch a record's metadata. Absence is `Ok(None)`, never an error.
    async fn get_metadata(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
    ) -> StorageResult<Option<FragmentRecord>>;

    /// Insert or replace a record's data.
    async fn put_data(&self, owner: &OwnerId, id: &FragmentId, data: Bytes) -> StorageResult<()>;

    /// Fetch a record's data. Absence is `Ok(None)`, never an error.
    async fn get_data(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<Option<Bytes>>;

    /// Every record belonging to `owner`. An unknown owner yields an empty vec.
    async fn query_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<FragmentRecord>>;

    /// Remove both metadata and data for a key.
    ///
    /// Data is removed before metadata, so a failed delete can leave a
    /// metadata-only record but never data without metadata, and retrying
    /// completes it. Missing metadata is `StorageError::NotFound`. Missing
    /// data is not an error, since a record may exist before its data is
    /// attached.
    async fn delete(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<()>;

    /// Static identifier for the backend type (e.g., "memory", "filesystem").
    /// Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is usable.
    ///
    /// The default implementation returns Ok(()), suitable for backends that
    /// have nothing to check.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
