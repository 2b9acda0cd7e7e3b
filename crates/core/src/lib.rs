//! Core domain types for the fragments store.
//!
//! This crate defines the data model shared by every other crate:
//! - Fragment records, owner and fragment identifiers
//! - The supported media type registry and extension table
//! - Requested representation parsing (`<id>.<ext>`)
//! - Shared configuration

pub mod config;
pub mod error;
pub mod fragment;
pub mod fragment_ref;
pub mod media_type;

pub use error::{Result, ValidationError};
pub use fragment::{FragmentId, FragmentRecord, NewFragment, OwnerId};
pub use fragment_ref::FragmentRef;
pub use media_type::{Family, MediaType, is_supported_type, mime_essence, supported_types};
