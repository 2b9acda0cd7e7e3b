//! Fragment lifecycle orchestration.

use crate::error::{ServiceError, ServiceResult};
use bytes::Bytes;
use fragments_convert::{ConversionEngine, Route};
use fragments_core::{FragmentId, FragmentRecord, FragmentRef, MediaType, NewFragment, OwnerId};
use fragments_storage::{StorageBackend, StorageError};
use serde::Serialize;
use std::sync::Arc;

/// Result of a listing: bare ids, or full records when expanded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FragmentList {
    Ids(Vec<FragmentId>),
    Expanded(Vec<FragmentRecord>),
}

impl FragmentList {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Expanded(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fragment bytes together with the Content-Type they should be served as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Representation {
    pub data: Bytes,
    pub content_type: String,
}

/// Create, read, update, delete and convert fragments.
///
/// Every lookup is scoped by owner; another owner's fragment is reported
/// exactly like a missing one.
#[derive(Clone)]
pub struct FragmentService {
    backend: Arc<dyn StorageBackend>,
    engine: ConversionEngine,
}

impl FragmentService {
    pub fn new(backend: Arc<dyn StorageBackend>, engine: ConversionEngine) -> Self {
        Self { backend, engine }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Validate and persist an empty fragment.
    pub async fn create(&self, owner: &OwnerId, fragment_type: &str) -> ServiceResult<FragmentRecord> {
        let record = FragmentRecord::new(NewFragment::new(owner.as_str(), fragment_type))?;
        self.backend.put_metadata(&record).await?;
        tracing::debug!(owner = %owner, id = %record.id(), fragment_type, "fragment created");
        Ok(record)
    }

    /// Create a fragment and attach its data.
    pub async fn create_with_data(
        &self,
        owner: &OwnerId,
        fragment_type: &str,
        data: Bytes,
    ) -> ServiceResult<FragmentRecord> {
        let mut record = self.create(owner, fragment_type).await?;
        self.attach_data(&mut record, data).await?;
        Ok(record)
    }

    /// Store `data` as the fragment's content and update its size.
    ///
    /// Metadata is written before data. `record` only changes once the
    /// metadata write succeeds. If the data write then fails, the stored
    /// metadata reports a size that does not match the stored bytes; the
    /// error is returned and retrying the call repairs it.
    pub async fn attach_data(&self, record: &mut FragmentRecord, data: Bytes) -> ServiceResult<()> {
        let mut updated = record.clone();
        updated.record_data(data.len());
        self.backend.put_metadata(&updated).await?;
        *record = updated;

        if let Err(e) = self
            .backend
            .put_data(record.owner_id(), record.id(), data)
            .await
        {
            tracing::warn!(
                owner = %record.owner_id(),
                id = %record.id(),
                size = record.size(),
                error = %e,
                "data write failed after metadata write; stored size no longer matches data"
            );
            return Err(e.into());
        }

        tracing::debug!(id = %record.id(), size = record.size(), "fragment data attached");
        Ok(())
    }

    /// Fetch an owned fragment's metadata.
    pub async fn get_by_id(&self, owner: &OwnerId, id: &FragmentId) -> ServiceResult<FragmentRecord> {
        self.backend
            .get_metadata(owner, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    /// Fetch an owned fragment's raw bytes.
    pub async fn get_data(&self, owner: &OwnerId, id: &FragmentId) -> ServiceResult<Bytes> {
        let record = self.get_by_id(owner, id).await?;
        self.load_data(&record).await
    }

    async fn load_data(&self, record: &FragmentRecord) -> ServiceResult<Bytes> {
        self.backend
            .get_data(record.owner_id(), record.id())
            .await?
            .ok_or_else(|| ServiceError::NotFound(record.id().clone()))
    }

    /// Replace an owned fragment's data. The declared type must equal the
    /// stored type exactly.
    pub async fn update(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
        declared_type: &str,
        data: Bytes,
    ) -> ServiceResult<FragmentRecord> {
        let mut record = self.get_by_id(owner, id).await?;
        if declared_type != record.fragment_type() {
            tracing::info!(id = %id, stored = record.fragment_type(), declared_type, "rejected type change");
            return Err(ServiceError::TypeImmutable {
                stored: record.fragment_type().to_string(),
                declared: declared_type.to_string(),
            });
        }

        self.attach_data(&mut record, data).await?;
        Ok(record)
    }

    /// Remove an owned fragment's metadata and data.
    pub async fn delete(&self, owner: &OwnerId, id: &FragmentId) -> ServiceResult<()> {
        self.get_by_id(owner, id).await?;

        match self.backend.delete(owner, id).await {
            Ok(()) => {
                tracing::debug!(owner = %owner, id = %id, "fragment deleted");
                Ok(())
            }
            // Removed concurrently since the existence check.
            Err(StorageError::NotFound(_)) => Err(ServiceError::NotFound(id.clone())),
            Err(e) => {
                tracing::warn!(owner = %owner, id = %id, error = %e, "fragment delete failed");
                Err(e.into())
            }
        }
    }

    /// Every fragment the owner has, in backend order.
    pub async fn list(&self, owner: &OwnerId, expand: bool) -> ServiceResult<FragmentList> {
        let records = self.backend.query_by_owner(owner).await?;
        if expand {
            return Ok(FragmentList::Expanded(records));
        }
        Ok(FragmentList::Ids(
            records.into_iter().map(|r| r.id().clone()).collect(),
        ))
    }

    /// Fetch an owned fragment's data converted to `target_type`.
    pub async fn convert_and_fetch(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
        target_type: &str,
    ) -> ServiceResult<Representation> {
        let record = self.get_by_id(owner, id).await?;
        self.convert_record(&record, target_type).await
    }

    async fn convert_record(
        &self,
        record: &FragmentRecord,
        target_type: &str,
    ) -> ServiceResult<Representation> {
        let data = self.load_data(record).await?;

        let route = ConversionEngine::resolve(record.fragment_type(), target_type)?;
        let data = self.run(route, data).await?;
        let content_type = MediaType::parse(target_type)
            .map(|t| t.essence().to_string())
            .unwrap_or_else(|| target_type.to_string());

        tracing::debug!(id = %record.id(), from = record.fragment_type(), to = %content_type, ?route, "fragment converted");
        Ok(Representation { data, content_type })
    }

    /// Fetch a requested representation, `<id>` or `<id>.<ext>`.
    ///
    /// Without a suffix the stored bytes come back with the stored type. A
    /// suffix outside the extension table is rejected before conversion.
    pub async fn fetch(&self, owner: &OwnerId, reference: &str) -> ServiceResult<Representation> {
        let reference = FragmentRef::parse(reference);
        let record = self.get_by_id(owner, &reference.id).await?;

        let Some(extension) = reference.extension.as_deref() else {
            let data = self.load_data(&record).await?;
            return Ok(Representation {
                data,
                content_type: record.fragment_type().to_string(),
            });
        };

        match MediaType::from_extension(extension) {
            Some(target) => self.convert_record(&record, target.essence()).await,
            None => Err(ServiceError::UnsupportedConversion {
                from: record.fragment_type().to_string(),
                to: format!(".{extension}"),
            }),
        }
    }

    /// Verify the storage backend is usable.
    pub async fn health_check(&self) -> ServiceResult<()> {
        self.backend.health_check().await?;
        Ok(())
    }

    /// Image work goes to the blocking pool; everything else runs inline.
    async fn run(&self, route: Route, data: Bytes) -> ServiceResult<Bytes> {
        if !route.is_cpu_bound() {
            return Ok(self.engine.apply(route, &data)?);
        }

        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.apply(route, &data))
            .await
            .map_err(|e| ServiceError::Internal(format!("conversion task failed: {e}")))?
            .map_err(ServiceError::from)
    }
}
