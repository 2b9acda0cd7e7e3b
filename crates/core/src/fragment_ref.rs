//! Requested fragment representations (`<id>` or `<id>.<ext>`).

use crate::fragment::FragmentId;
use crate::media_type::MediaType;

/// A fragment id with an optional representation suffix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentRef {
    pub id: FragmentId,
    /// Extension without the leading dot. `Some("")` for a trailing dot.
    pub extension: Option<String>,
}

impl FragmentRef {
    /// Split on the last dot: `"abc.md"` -> (`abc`, `md`), `"abc"` -> (`abc`, none).
    pub fn parse(value: &str) -> Self {
        match value.rsplit_once('.') {
            Some((id, ext)) => Self {
                id: FragmentId::new(id),
                extension: Some(ext.to_string()),
            },
            None => Self {
                id: FragmentId::new(value),
                extension: None,
            },
        }
    }

    /// The media type the suffix asks for.
    ///
    /// `None` when there is no suffix or the suffix is not in the extension
    /// table; use [`FragmentRef::extension`] to tell the two apart.
    pub fn target_type(&self) -> Option<MediaType> {
        self.extension.as_deref().and_then(MediaType::from_extension)
    }
}
