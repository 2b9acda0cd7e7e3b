//! Fragment records and identifiers.

use crate::error::{Result, ValidationError};
use crate::media_type::{self, MediaType};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Opaque fragment identifier, unique per owner.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(String);

impl FragmentId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentId({})", self.0)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FragmentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque identifier of the principal that owns a fragment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(owner: impl Into<String>) -> Self {
        Self(owner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Construction request for a [`FragmentRecord`].
///
/// Every field is optional so that absence can be reported as a validation
/// failure rather than silently defaulted.
#[derive(Clone, Debug, Default)]
pub struct NewFragment {
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub fragment_type: Option<String>,
    pub size: Option<i64>,
}

impl NewFragment {
    /// A request for an empty fragment of the given type.
    pub fn new(owner_id: impl Into<String>, fragment_type: impl Into<String>) -> Self {
        Self {
            id: None,
            owner_id: Some(owner_id.into()),
            fragment_type: Some(fragment_type.into()),
            size: Some(0),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Size as supplied by a caller, before validation.
enum SizeArg {
    Absent,
    Int(i64),
    Float(f64),
    NonNumeric(String),
}

/// Validated fragment metadata.
///
/// `owner_id` and `fragment_type` are fixed at construction. `size` always
/// matches the stored data once data has been attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRecord {
    id: FragmentId,
    owner_id: OwnerId,
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated: OffsetDateTime,
    #[serde(rename = "type")]
    fragment_type: String,
    size: u64,
}

impl FragmentRecord {
    /// Validate a construction request and build the record.
    ///
    /// Checks run in order (owner, type, size, supported type) and the
    /// first violation is returned.
    pub fn new(request: NewFragment) -> Result<Self> {
        let size = match request.size {
            Some(size) => SizeArg::Int(size),
            None => SizeArg::Absent,
        };
        Self::validate(request.id, request.owner_id, request.fragment_type, size)
    }

    /// Build a record from loosely typed JSON (`id`, `ownerId`, `type`, `size`).
    ///
    /// Non-string owner or type values count as missing. A `size` that is not
    /// a number is rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);

        let size = match value.get("size") {
            None | Some(serde_json::Value::Null) => SizeArg::Absent,
            Some(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(n) => SizeArg::Int(n),
                None => SizeArg::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Some(other) => SizeArg::NonNumeric(other.to_string()),
        };

        Self::validate(field("id"), field("ownerId"), field("type"), size)
    }

    fn validate(
        id: Option<String>,
        owner_id: Option<String>,
        fragment_type: Option<String>,
        size: SizeArg,
    ) -> Result<Self> {
        let id = id
            .filter(|id| !id.is_empty())
            .map(FragmentId::new)
            .unwrap_or_else(FragmentId::generate);

        let owner_id = owner_id
            .filter(|owner| !owner.is_empty())
            .ok_or(ValidationError::MissingOwner)?;
        let fragment_type = fragment_type
            .filter(|t| !t.trim().is_empty())
            .ok_or(ValidationError::MissingType)?;

        let size = match size {
            SizeArg::Absent => 0,
            SizeArg::Int(n) if n < 0 => return Err(ValidationError::NegativeSize(n.to_string())),
            SizeArg::Int(n) => n as u64,
            SizeArg::Float(f) if f < 0.0 => {
                return Err(ValidationError::NegativeSize(f.to_string()));
            }
            SizeArg::Float(f) if f.fract() == 0.0 && f < u64::MAX as f64 => f as u64,
            SizeArg::Float(f) => return Err(ValidationError::NonNumericSize(f.to_string())),
            SizeArg::NonNumeric(raw) => return Err(ValidationError::NonNumericSize(raw)),
        };

        if !media_type::is_supported_type(&fragment_type) {
            tracing::debug!(fragment_type = %fragment_type, "rejecting unsupported fragment type");
            return Err(ValidationError::UnsupportedType(fragment_type));
        }

        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id,
            owner_id: OwnerId::new(owner_id),
            created: now,
            updated: now,
            fragment_type,
            size,
        })
    }

    pub fn id(&self) -> &FragmentId {
        &self.id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// The type exactly as supplied at creation, parameters included.
    pub fn fragment_type(&self) -> &str {
        &self.fragment_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created(&self) -> OffsetDateTime {
        self.created
    }

    pub fn updated(&self) -> OffsetDateTime {
        self.updated
    }

    /// The type without parameters: `"text/html; charset=utf-8"` -> `"text/html"`.
    pub fn mime_type(&self) -> String {
        media_type::mime_essence(&self.fragment_type)
    }

    /// The registered media type of this fragment.
    pub fn media_type(&self) -> Option<MediaType> {
        MediaType::parse(&self.fragment_type)
    }

    /// Whether this is a `text/*` fragment.
    pub fn is_text(&self) -> bool {
        self.mime_type().starts_with("text/")
    }

    /// Every registered type, advertised as possible representations.
    pub fn formats(&self) -> Vec<&'static str> {
        media_type::supported_types()
    }

    /// Bump the `updated` timestamp.
    pub fn touch(&mut self) {
        self.updated = OffsetDateTime::now_utc();
    }

    /// Record that `len` bytes of data were attached.
    pub fn record_data(&mut self, len: usize) {
        self.size = len as u64;
        self.touch();
    }
}
