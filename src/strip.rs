//! Metadata stripping
//!
//! Removes metadata from JPEG, PNG and WebP files with `img-parts`, leaving the
//! compressed image data and ICC color profiles untouched.
//!
//! | Format | Removed |
//! |---|---|
//! | JPEG | APP1 (EXIF, XMP), APP13 (IPTC/Photoshop) |
//! | PNG | `eXIf`, `tEXt`, `zTXt`, `iTXt`, `tIME` |
//! | WebP | `EXIF`, `XMP ` |

use crate::adapters::MetadataSource;
use crate::error::MetadataError;
use crate::pipeline::analyze_mapping;
use crate::types::ImageReport;
use img_parts::jpeg::{markers, Jpeg};
use img_parts::png::Png;
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};
use serde::Serialize;
use std::fs;
use std::path::Path;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const PNG_TEXT_CHUNKS: [[u8; 4]; 4] = [*b"tEXt", *b"zTXt", *b"iTXt", *b"tIME"];
const WEBP_XMP: [u8; 4] = *b"XMP ";

/// Container formats metascrub can strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    /// Detect the container from its leading bytes
    pub fn detect(data: &[u8]) -> Option<ImageFormat> {
        if data.starts_with(&[0xFF, 0xD8]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(PNG_SIGNATURE) {
            Some(ImageFormat::Png)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            None
        }
    }
}

/// Stripped image bytes plus what was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    /// JPEG segments or PNG/WebP chunks dropped
    pub removed_segments: usize,
    pub removed_bytes: usize,
}

/// Before/after comparison of a strip operation
#[derive(Debug, Clone, Serialize)]
pub struct StripOutcome {
    pub format: ImageFormat,
    pub removed_segments: usize,
    pub removed_bytes: usize,
    pub before: ImageReport,
    pub after: ImageReport,
}

/// Drop metadata from an image byte stream
pub fn strip_image(data: &[u8]) -> Result<StrippedImage, MetadataError> {
    let format = ImageFormat::detect(data).ok_or_else(|| {
        MetadataError::UnsupportedFormat("only JPEG, PNG and WebP files can be stripped".to_string())
    })?;
    let input = Bytes::copy_from_slice(data);

    let mut bytes = Vec::with_capacity(data.len());
    let removed_segments = match format {
        ImageFormat::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(input)?;
            let before = jpeg.segments().len();
            jpeg.set_exif(None);
            jpeg.segments_mut()
                .retain(|s| s.marker() != markers::APP1 && s.marker() != markers::APP13);
            let removed = before - jpeg.segments().len();
            jpeg.encoder().write_to(&mut bytes)?;
            removed
        }
        ImageFormat::Png => {
            let mut png = Png::from_bytes(input)?;
            let before = png.chunks().len();
            png.set_exif(None);
            png.chunks_mut()
                .retain(|c| !PNG_TEXT_CHUNKS.contains(&c.kind()));
            let removed = before - png.chunks().len();
            png.encoder().write_to(&mut bytes)?;
            removed
        }
        ImageFormat::WebP => {
            let mut webp = WebP::from_bytes(input)?;
            let before = webp.chunks().len();
            webp.set_exif(None);
            webp.chunks_mut().retain(|c| c.id() != WEBP_XMP);
            let removed = before - webp.chunks().len();
            webp.encoder().write_to(&mut bytes)?;
            removed
        }
    };

    Ok(StrippedImage {
        format,
        removed_bytes: data.len().saturating_sub(bytes.len()),
        bytes,
        removed_segments,
    })
}

/// Strip an image file into `output` and compare its metadata before and after
pub fn strip_file(
    source: &dyn MetadataSource,
    input: &Path,
    output: &Path,
) -> Result<StripOutcome, MetadataError> {
    let data = fs::read(input)?;
    let before_mapping = source.load(input)?;

    let stripped = strip_image(&data)?;
    fs::write(output, &stripped.bytes)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        format = ?stripped.format,
        segments = stripped.removed_segments,
        "metadata stripped"
    );

    let after_mapping = source.load(output)?;

    Ok(StripOutcome {
        format: stripped.format,
        removed_segments: stripped.removed_segments,
        removed_bytes: stripped.removed_bytes,
        before: analyze_mapping(input, &before_mapping),
        after: analyze_mapping(output, &after_mapping),
    })
}
