//! Fragment service for the fragments store.
//!
//! Ties validated records, a storage backend and the conversion engine
//! together behind owner-scoped operations.

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::{FragmentList, FragmentService, Representation};

use fragments_convert::ConversionEngine;
use fragments_core::config::AppConfig;

/// Assemble a service from configuration.
pub async fn from_config(config: &AppConfig) -> ServiceResult<FragmentService> {
    config.conversion.validate().map_err(ServiceError::Config)?;

    let backend = fragments_storage::from_config(&config.storage).await?;
    tracing::info!(backend = backend.backend_name(), "storage backend initialized");

    Ok(FragmentService::new(
        backend,
        ConversionEngine::new(&config.conversion),
    ))
}
