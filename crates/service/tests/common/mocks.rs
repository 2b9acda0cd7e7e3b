//! Backends that fail on demand.

use async_trait::async_trait;
use bytes::Bytes;
use fragments_core::{FragmentId, FragmentRecord, OwnerId};
use fragments_storage::{MemoryBackend, StorageBackend, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Wraps a [`MemoryBackend`], failing selected writes while a switch is on.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyBackend {
    pub inner: MemoryBackend,
    pub fail_put_metadata: AtomicBool,
    pub fail_put_data: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_health: AtomicBool,
    /// Number of `delete` calls that reached the backend.
    pub delete_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_put_metadata(&self, fail: bool) {
        self.fail_put_metadata.store(fail, Ordering::SeqCst);
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_put_data(&self, fail: bool) {
        self.fail_put_data.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_health(&self, fail: bool) {
        self.fail_health.store(fail, Ordering::SeqCst);
    }
}

fn injected(op: &str) -> StorageError {
    StorageError::Io(io::Error::other(format!("injected {op} failure")))
}

#[async_trait]
impl StorageBackend for FlakyBackend {
    async fn put_metadata(&self, record: &FragmentRecord) -> StorageResult<()> {
        if self.fail_put_metadata.load(Ordering::SeqCst) {
            return Err(injected("put_metadata"));
        }
        self.inner.put_metadata(record).await
    }

    async fn get_metadata(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
    ) -> StorageResult<Option<FragmentRecord>> {
        self.inner.get_metadata(owner, id).await
    }

    async fn put_data(&self, owner: &OwnerId, id: &FragmentId, data: Bytes) -> StorageResult<()> {
        if self.fail_put_data.load(Ordering::SeqCst) {
            return Err(injected("put_data"));
        }
        self.inner.put_data(owner, id, data).await
    }

    async fn get_data(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<Option<Bytes>> {
        self.inner.get_data(owner, id).await
    }

    async fn query_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<FragmentRecord>> {
        self.inner.query_by_owner(owner).await
    }

    async fn delete(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed {
                key: format!("{owner}/{id}"),
                failures: vec!["data: injected delete failure".to_string()],
            });
        }
        self.inner.delete(owner, id).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn health_check(&self) -> StorageResult<()> {
        if self.fail_health.load(Ordering::SeqCst) {
            return Err(injected("health"));
        }
        Ok(())
    }
}
