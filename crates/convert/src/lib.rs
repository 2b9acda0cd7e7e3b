//! Representation conversion for fragments.
//!
//! This crate provides:
//! - The conversion matrix as a route table
//! - Text conversions (JSON flattening, markdown rendering)
//! - Image transcoding between PNG, JPEG, WebP and GIF

pub mod engine;
pub mod error;
mod raster;
mod text;

pub use engine::{ConversionEngine, Route};
pub use error::{ConvertError, ConvertResult};
