//! Error types for metascrub

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, reporting or stripping metadata.
///
/// Corrupted field values never surface here; they degrade to
/// [`FieldValue::Invalid`](crate::types::FieldValue) or
/// [`GpsDecode::Undecidable`](crate::types::GpsDecode) instead.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unparsable EXIF source: {0}")]
    Exif(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed image: {0}")]
    MalformedImage(String),

    #[error("Report formatting failed")]
    Format(#[from] std::fmt::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl From<exif::Error> for MetadataError {
    fn from(e: exif::Error) -> Self {
        match e {
            exif::Error::Io(io) => MetadataError::Io(io),
            other => MetadataError::Exif(other.to_string()),
        }
    }
}

impl From<img_parts::Error> for MetadataError {
    fn from(e: img_parts::Error) -> Self {
        MetadataError::MalformedImage(e.to_string())
    }
}
