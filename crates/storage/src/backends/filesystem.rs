//! Local filesystem storage backend.
//!
//! Layout under the root directory:
//!
//! ```text
//! metadata/<owner>/<id>.json
//! data/<owner>/<id>
//! ```
//!
//! Owner and id segments are percent-encoded, so any opaque identifier maps
//! to a single safe file name.

use crate::error::{StorageError, StorageResult};
use crate::traits::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use fragments_core::{FragmentId, FragmentRecord, OwnerId};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

const METADATA_DIR: &str = "metadata";
const DATA_DIR: &str = "data";
const METADATA_SUFFIX: &str = ".json";

/// Characters escaped in path segments. `.` stays escaped so no segment can
/// be `..` or collide with a temp file suffix.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Local filesystem fragment store.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend, creating the directory layout if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(METADATA_DIR)).await?;
        fs::create_dir_all(root.join(DATA_DIR)).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn segment(value: &str) -> String {
        utf8_percent_encode(value, SEGMENT).to_string()
    }

    fn owner_dir_key(owner: &OwnerId) -> String {
        format!("{METADATA_DIR}/{}", Self::segment(owner.as_str()))
    }

    fn metadata_key(owner: &OwnerId, id: &FragmentId) -> String {
        format!(
            "{}/{}{METADATA_SUFFIX}",
            Self::owner_dir_key(owner),
            Self::segment(id.as_str())
        )
    }

    fn data_key(owner: &OwnerId, id: &FragmentId) -> String {
        format!(
            "{DATA_DIR}/{}/{}",
            Self::segment(owner.as_str()),
            Self::segment(id.as_str())
        )
    }

    /// Empty identifiers have no file name.
    fn addressable(owner: &OwnerId, id: &FragmentId) -> bool {
        !owner.as_str().is_empty() && !id.as_str().is_empty()
    }

    fn require_addressable(owner: &OwnerId, id: &FragmentId) -> StorageResult<()> {
        if Self::addressable(owner, id) {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(format!(
                "empty owner or fragment id: {owner:?}/{id:?}"
            )))
        }
    }

    /// Get the full path for a key, with path traversal protection.
    ///
    /// Runs on the blocking pool because it may stat and canonicalize.
    async fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let root = self.root.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || Self::key_path_sync(&root, &key))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }

    /// Returns an error if the key would escape the storage root, including
    /// through a symlink inside it.
    fn key_path_sync(root: &Path, key: &str) -> StorageResult<PathBuf> {
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }

        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidKey(format!(
                    "contains unsafe path component: {key}"
                )));
            }
        }

        let path = root.join(key);

        match std::fs::symlink_metadata(&path) {
            Ok(_) => {
                let root_canonical = root.canonicalize()?;
                let canonical = path.canonicalize().map_err(|_| {
                    StorageError::InvalidKey(format!("symlink target missing or invalid: {key}"))
                })?;
                if !canonical.starts_with(&root_canonical) {
                    return Err(StorageError::InvalidKey(format!(
                        "resolved path escapes storage root: {key}"
                    )));
                }
                Ok(path)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Write to a uniquely named temp file, fsync, then rename into place.
    async fn write_atomic(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_path(key).await?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = path.with_file_name(
            path.file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }
        Ok(())
    }

    async fn read_optional(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.key_path(key).await?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Remove a file. `Ok(false)` when it was already absent.
    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key).await?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    #[instrument(skip(self, record), fields(backend = "filesystem", owner = %record.owner_id(), id = %record.id()))]
    async fn put_metadata(&self, record: &FragmentRecord) -> StorageResult<()> {
        Self::require_addressable(record.owner_id(), record.id())?;
        let json = serde_json::to_vec(record)?;
        self.write_atomic(&Self::metadata_key(record.owner_id(), record.id()), &json)
            .await
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_metadata(
        &self,
        owner: &OwnerId,
        id: &FragmentId,
    ) -> StorageResult<Option<FragmentRecord>> {
        if !Self::addressable(owner, id) {
            return Ok(None);
        }
        match self.read_optional(&Self::metadata_key(owner, id)).await? {
            Some(json) => Ok(Some(serde_json::from_slice(&json)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put_data(&self, owner: &OwnerId, id: &FragmentId, data: Bytes) -> StorageResult<()> {
        Self::require_addressable(owner, id)?;
        self.write_atomic(&Self::data_key(owner, id), &data).await
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_data(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<Option<Bytes>> {
        if !Self::addressable(owner, id) {
            return Ok(None);
        }
        Ok(self
            .read_optional(&Self::data_key(owner, id))
            .await?
            .map(Bytes::from))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn query_by_owner(&self, owner: &OwnerId) -> StorageResult<Vec<FragmentRecord>> {
        let mut records = Vec::new();
        if owner.as_str().is_empty() {
            return Ok(records);
        }

        let dir = self.key_path(&Self::owner_dir_key(owner)).await?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(e) => return Err(StorageError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            // Skip symlinks, directories and in-flight temp files.
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(METADATA_SUFFIX) {
                continue;
            }
            let json = fs::read(entry.path()).await?;
            records.push(serde_json::from_slice::<FragmentRecord>(&json)?);
        }

        records.sort_by(|a, b| {
            a.created()
                .cmp(&b.created())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(records)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, owner: &OwnerId, id: &FragmentId) -> StorageResult<()> {
        if !Self::addressable(owner, id) {
            return Err(StorageError::NotFound(format!("{owner}/{id}")));
        }

        let key = format!("{owner}/{id}");

        // Data goes first so a failure never strands a blob without metadata.
        if let Err(e) = self.remove(&Self::data_key(owner, id)).await {
            return Err(StorageError::DeleteFailed {
                key,
                failures: vec![format!("data: {e}")],
            });
        }

        match self.remove(&Self::metadata_key(owner, id)).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StorageError::NotFound(key)),
            Err(e) => Err(StorageError::DeleteFailed {
                key,
                failures: vec![format!("metadata: {e}")],
            }),
        }
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> StorageResult<()> {
        for dir in [METADATA_DIR, DATA_DIR] {
            let meta = fs::metadata(self.root.join(dir)).await?;
            if !meta.is_dir() {
                return Err(StorageError::Config(format!(
                    "{} is not a directory",
                    self.root.join(dir).display()
                )));
            }
        }
        Ok(())
    }
}
