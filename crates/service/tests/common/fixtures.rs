//! Service fixtures.

use bytes::Bytes;
use fragments_convert::ConversionEngine;
use fragments_core::OwnerId;
use fragments_service::FragmentService;
use fragments_storage::{FilesystemBackend, MemoryBackend, StorageBackend};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A service under test, holding its scratch directory alive.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestService {
    pub service: FragmentService,
    temp_dir: Option<TempDir>,
}

#[allow(dead_code)]
impl TestService {
    pub fn memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    pub async fn filesystem() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let backend = FilesystemBackend::new(temp_dir.path())
            .await
            .expect("Failed to create filesystem backend");
        Self {
            service: FragmentService::new(Arc::new(backend), ConversionEngine::default()),
            temp_dir: Some(temp_dir),
        }
    }

    /// Root directory of a filesystem-backed service.
    pub fn root(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            service: FragmentService::new(backend, ConversionEngine::default()),
            temp_dir: None,
        }
    }
}

#[allow(dead_code)]
pub fn owner(name: &str) -> OwnerId {
    OwnerId::from(name)
}

/// A small opaque gradient encoded as `format`.
#[allow(dead_code)]
pub fn encoded_image(format: ImageFormat) -> Bytes {
    let img = RgbaImage::from_fn(8, 6, |x, y| {
        Rgba([(x * 30) as u8, (y * 40) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut out, format)
            .expect("encode fixture"),
        _ => img.write_to(&mut out, format).expect("encode fixture"),
    }
    Bytes::from(out.into_inner())
}
