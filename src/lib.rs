//! metascrub - EXIF metadata inspection, privacy scoring and stripping
//!
//! metascrub reads the EXIF metadata embedded in image files and turns it into
//! an auditable report through a deterministic pipeline: source loading →
//! normalization → GPS decoding → privacy classification → report encoding.
//!
//! ## Modules
//!
//! - **Inspection**: Single-image reports with important fields, GPS and risk
//! - **Bulk scanning**: Consolidated per-folder reports (JSON and CSV)
//! - **Stripping**: Remove metadata from JPEG, PNG and WebP files

pub mod adapters;
pub mod encoder;
pub mod error;
pub mod gps;
pub mod normalizer;
pub mod pipeline;
pub mod privacy;
pub mod strip;
pub mod types;

// FFI bindings for C interop, built into every crate type
pub mod ffi;

#[cfg(test)]
mod fixtures;

pub use adapters::{KamadakSource, MetadataSource};
pub use encoder::ReportEncoder;
pub use error::MetadataError;
pub use gps::decode;
pub use pipeline::{analyze_file, analyze_mapping, scan_folder, MetadataProcessor, ScanOptions};
pub use privacy::{classify, PrivacyClassifier};
pub use strip::{strip_file, strip_image, ImageFormat};

/// metascrub version embedded in CLI and FFI output
pub const METASCRUB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "metascrub";
