//! Fragment persistence for the fragments store.
//!
//! This crate provides:
//! - The `StorageBackend` contract over two namespaces (metadata, data)
//! - An in-memory reference backend
//! - A local filesystem backend with atomic writes

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, memory::MemoryBackend};
pub use error::{StorageError, StorageResult};
pub use traits::StorageBackend;

use fragments_core::config::StorageConfig;
use std::sync::Arc;

/// Create a storage backend from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            tracing::debug!(root = %path.display(), "filesystem backend ready");
            Ok(Arc::new(backend))
        }
    }
}
