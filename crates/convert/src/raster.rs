//! Image family conversions.

use crate::error::{ConvertError, ConvertResult};
use bytes::Bytes;
use fragments_core::MediaType;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Decode `content` (format sniffed from its header) and re-encode as `target`.
///
/// JPEG drops alpha and encodes at `jpeg_quality`. PNG and WebP are lossless.
pub(crate) fn transcode(content: &[u8], target: MediaType, jpeg_quality: u8) -> ConvertResult<Bytes> {
    let decoded = image::load_from_memory(content)?;
    let mut out = Cursor::new(Vec::with_capacity(content.len()));

    match target {
        MediaType::ImagePng => decoded.write_to(&mut out, ImageFormat::Png)?,
        MediaType::ImageWebp => {
            DynamicImage::ImageRgba8(decoded.to_rgba8()).write_to(&mut out, ImageFormat::WebP)?
        }
        MediaType::ImageGif => {
            DynamicImage::ImageRgba8(decoded.to_rgba8()).write_to(&mut out, ImageFormat::Gif)?
        }
        MediaType::ImageJpeg => {
            let rgb = decoded.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, jpeg_quality).encode_image(&rgb)?;
        }
        other => {
            return Err(ConvertError::Unsupported {
                from: "image".to_string(),
                to: other.essence().to_string(),
            });
        }
    }

    Ok(Bytes::from(out.into_inner()))
}
