//! Supported media types.
//!
//! The registry below is the single source of truth for which types a
//! fragment may be created with, which extensions map to which type, and
//! which conversion family a type belongs to. Adding a format is a table
//! change.

use std::fmt;

/// Conversion family. Formats only convert within their own family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Text,
    Image,
}

/// A registered media type.
///
/// Variant order must match [`REGISTRY`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    TextPlain,
    TextMarkdown,
    TextHtml,
    ApplicationJson,
    ImagePng,
    ImageJpeg,
    ImageWebp,
    ImageGif,
}

struct Entry {
    essence: &'static str,
    extension: &'static str,
    family: Family,
}

const REGISTRY: [Entry; 8] = [
    Entry {
        essence: "text/plain",
        extension: "txt",
        family: Family::Text,
    },
    Entry {
        essence: "text/markdown",
        extension: "md",
        family: Family::Text,
    },
    Entry {
        essence: "text/html",
        extension: "html",
        family: Family::Text,
    },
    Entry {
        essence: "application/json",
        extension: "json",
        family: Family::Text,
    },
    Entry {
        essence: "image/png",
        extension: "png",
        family: Family::Image,
    },
    Entry {
        essence: "image/jpeg",
        extension: "jpg",
        family: Family::Image,
    },
    Entry {
        essence: "image/webp",
        extension: "webp",
        family: Family::Image,
    },
    Entry {
        essence: "image/gif",
        extension: "gif",
        family: Family::Image,
    },
];

impl MediaType {
    /// Every registered type, in registry order.
    pub const ALL: [MediaType; 8] = [
        MediaType::TextPlain,
        MediaType::TextMarkdown,
        MediaType::TextHtml,
        MediaType::ApplicationJson,
        MediaType::ImagePng,
        MediaType::ImageJpeg,
        MediaType::ImageWebp,
        MediaType::ImageGif,
    ];

    fn entry(self) -> &'static Entry {
        &REGISTRY[self as usize]
    }

    /// The `type/subtype` string, without parameters.
    pub fn essence(self) -> &'static str {
        self.entry().essence
    }

    /// Canonical file extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        self.entry().extension
    }

    pub fn family(self) -> Family {
        self.entry().family
    }

    /// Look up a bare `type/subtype` string.
    pub fn from_essence(essence: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.essence() == essence)
    }

    /// Resolve a requested extension (`txt` or `.txt`) to its media type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL.into_iter().find(|t| t.extension() == ext)
    }

    /// Parse a Content-Type value, ignoring any parameters.
    pub fn parse(value: &str) -> Option<Self> {
        Self::from_essence(&mime_essence(value))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.essence())
    }
}

/// Strip parameters from a Content-Type value and normalise case:
/// `"Text/HTML; charset=utf-8"` -> `"text/html"`.
pub fn mime_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a Content-Type value names a registered type.
///
/// A charset parameter is stripped before the lookup. Any other parameter
/// makes the value unsupported.
pub fn is_supported_type(value: &str) -> bool {
    if value.contains("charset") {
        MediaType::parse(value).is_some()
    } else {
        MediaType::from_essence(value).is_some()
    }
}

/// Every registered type as a Content-Type string.
pub fn supported_types() -> Vec<&'static str> {
    MediaType::ALL.iter().map(|t| t.essence()).collect()
}
