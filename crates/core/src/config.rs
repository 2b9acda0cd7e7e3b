//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-process maps. Contents are lost when the process exits.
    #[default]
    Memory,
    /// Metadata documents and data blobs under a local directory.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
}

impl StorageConfig {
    /// Validate backend settings.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Memory => Ok(()),
            Self::Filesystem { path } => {
                if path.as_os_str().is_empty() {
                    return Err("filesystem storage requires a non-empty path".to_string());
                }
                Ok(())
            }
        }
    }
}

/// Conversion settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Quality (1-100) used when encoding JPEG output.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 {
    85
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Conversion configuration.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()?;
        self.conversion.validate()
    }
}
