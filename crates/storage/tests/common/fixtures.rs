//! Backend and record fixtures.

use fragments_core::{FragmentRecord, NewFragment};
use fragments_storage::{FilesystemBackend, MemoryBackend, StorageBackend};
use std::sync::Arc;
use tempfile::TempDir;

/// A backend under test, holding its scratch directory alive.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestBackend {
    pub backend: Arc<dyn StorageBackend>,
    _temp_dir: Option<TempDir>,
}

#[allow(dead_code)]
impl TestBackend {
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::new()),
            _temp_dir: None,
        }
    }

    pub async fn filesystem() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let backend = FilesystemBackend::new(temp_dir.path())
            .await
            .expect("Failed to create filesystem backend");
        Self {
            backend: Arc::new(backend),
            _temp_dir: Some(temp_dir),
        }
    }

    pub fn store(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }
}

/// A validated record with a fixed id.
#[allow(dead_code)]
pub fn record(owner: &str, id: &str, fragment_type: &str) -> FragmentRecord {
    FragmentRecord::new(NewFragment::new(owner, fragment_type).with_id(id))
        .expect("fixture record should be valid")
}
