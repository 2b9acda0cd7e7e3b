//! The conversion matrix.

use crate::error::{ConvertError, ConvertResult};
use crate::{raster, text};
use bytes::Bytes;
use fragments_core::config::ConversionConfig;
use fragments_core::{Family, MediaType};

/// How a `(from, to)` pair is converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Same type: bytes returned untouched.
    Identity,
    /// Text read as-is under a different type.
    Passthrough,
    /// JSON re-serialized with all quote characters removed.
    JsonToText,
    /// CommonMark rendered to HTML.
    MarkdownToHtml,
    /// Image decoded and re-encoded into the given codec.
    Transcode(MediaType),
}

impl Route {
    /// Whether the route does enough work to belong on a blocking thread.
    pub fn is_cpu_bound(self) -> bool {
        matches!(self, Self::Transcode(_))
    }
}

/// Text family pairs other than identity.
const TEXT_ROUTES: &[(MediaType, MediaType, Route)] = &[
    (MediaType::TextMarkdown, MediaType::TextPlain, Route::Passthrough),
    (MediaType::TextHtml, MediaType::TextPlain, Route::Passthrough),
    (MediaType::ApplicationJson, MediaType::TextPlain, Route::JsonToText),
    (MediaType::TextMarkdown, MediaType::TextHtml, Route::MarkdownToHtml),
];

/// Stateless converter between registered representations.
#[derive(Clone, Debug)]
pub struct ConversionEngine {
    jpeg_quality: u8,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}

impl ConversionEngine {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Find the route between two registered types.
    pub fn route(from: MediaType, to: MediaType) -> Option<Route> {
        if from == to {
            return Some(Route::Identity);
        }
        match (from.family(), to.family()) {
            (Family::Image, Family::Image) => Some(Route::Transcode(to)),
            (Family::Text, Family::Text) => TEXT_ROUTES
                .iter()
                .find(|(f, t, _)| *f == from && *t == to)
                .map(|(_, _, route)| *route),
            _ => None,
        }
    }

    /// Resolve Content-Type strings (parameters ignored) to a route.
    pub fn resolve(from: &str, to: &str) -> ConvertResult<Route> {
        MediaType::parse(from)
            .zip(MediaType::parse(to))
            .and_then(|(f, t)| Self::route(f, t))
            .ok_or_else(|| ConvertError::Unsupported {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Every type reachable from `from`, identity included.
    pub fn targets(from: MediaType) -> Vec<MediaType> {
        MediaType::ALL
            .into_iter()
            .filter(|to| Self::route(from, *to).is_some())
            .collect()
    }

    /// Convert `content` from one representation to another.
    ///
    /// The source type is trusted; pairs missing from the matrix fail with
    /// [`ConvertError::Unsupported`].
    pub fn convert(&self, content: &Bytes, from: &str, to: &str) -> ConvertResult<Bytes> {
        let route = Self::resolve(from, to)?;
        tracing::debug!(from, to, ?route, size = content.len(), "converting fragment");
        self.apply(route, content)
    }

    /// Run an already resolved route.
    pub fn apply(&self, route: Route, content: &Bytes) -> ConvertResult<Bytes> {
        match route {
            Route::Identity | Route::Passthrough => Ok(content.clone()),
            Route::JsonToText => text::json_to_text(content),
            Route::MarkdownToHtml => text::markdown_to_html(content),
            Route::Transcode(target) => raster::transcode(content, target, self.jpeg_quality),
        }
    }
}
