//! In-process storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fragments_core::{FragmentId, FragmentRecord, OwnerId};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::instrument;

type Key = (OwnerId, FragmentId);

struct MetadataEntry {
    /// Insertion sequence number; kept across upserts so listings stay stable.
    position: u64,
    record: FragmentRecord,
}

/// Two independent in-memory maps, one per namespace.
///
/// Owner listings come back in first-insertion order.
#[derive(Default)]
pub struct MemoryBackend {
    metadata: DashMap<Key, MetadataEntry>,
    data: DashMap<Key, Bytes>,
    sequence: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner: &OwnerId, id: &FragmentId) -> Key {
        (owner.clone(), id.clone())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    #[instrument(skip(self, record), fields(backend = "memory", owner = %record.owner_id(), id = %record.id()))]
    async fn put_metadata(&self, record: &FragmentRecord) -> StorageResult<()> {
        let key = Self::key(record.owner_id(), record.id());
        match self.metadata.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().record = record.clone();
            }
            Entry::Vacant(entry) => {
                entry.insert(MetadataEntry {
                    position: self.sequence.fetch_add(1, Ordering::Relaxed),
                    record: record.clone(),
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get_metadata(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
    ) -> StorageResult<Option<FragmentRecord>> {
        Ok(self
            .metadata
            .get(&Self::key(owner, id))
            .map(|entry| entry.record.clone()))
    }

    #[instrument(skip(self, data), fields(backend = "memory", size = data.len()))]
    async fn put_data(&self, owner: &OwnerId, id: &FragmentId, data: Bytes) -> StorageResult<()> {
        self.data.insert(Self::key(owner, id), data);
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get_data(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<Option<Bytes>> {
        Ok(self
            .data
            .get(&Self::key(owner, id))
            .map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn query_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<FragmentRecord>> {
        let mut entries: Vec<(u64, FragmentRecord)> = self
            .metadata
            .iter()
            .filter(|entry| entry.key().0 == *owner)
            .map(|entry| (entry.position, entry.record.clone()))
            .collect();
        entries.sort_by_key(|(position, _)| *position);
        Ok(entries.into_iter().map(|(_, record)| record).collect())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn delete(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<()> {
        let key = Self::key(owner, id);
        self.data.remove(&key);
        match self.metadata.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!("{owner}/{id}"))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
