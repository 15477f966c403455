//! Metadata source adapters
//!
//! This module provides adapters that read EXIF metadata out of image files and
//! map it to the flat, source-agnostic [`MetadataMapping`].

mod kamadak;

pub use kamadak::KamadakSource;

use crate::error::MetadataError;
use crate::types::MetadataMapping;
use std::path::Path;

/// Trait for metadata sources
pub trait MetadataSource {
    /// Read the metadata of an image file.
    ///
    /// A file that cannot be opened is an error. A file that opens but holds no
    /// parsable EXIF data yields an empty mapping.
    fn load(&self, path: &Path) -> Result<MetadataMapping, MetadataError>;
}
