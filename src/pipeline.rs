//! Pipeline orchestration
//!
//! This module provides the public API for metascrub.
//! It runs the stages from an image file (or an already loaded mapping) to a
//! finished report: load, normalize, decode GPS, classify.

use crate::adapters::{KamadakSource, MetadataSource};
use crate::error::MetadataError;
use crate::gps::gps_report;
use crate::normalizer::Normalizer;
use crate::privacy::{PrivacyClassifier, SENSITIVE_TAGS};
use crate::types::{BulkReport, BulkSummary, ImageReport, MetadataMapping, RiskLevel};
use chrono::Utc;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fields shown in every report, in display order
pub const IMPORTANT_FIELDS: [&str; 8] = [
    "Make",
    "Model",
    "DateTimeOriginal",
    "ExposureTime",
    "FNumber",
    "PhotographicSensitivity",
    "FocalLength",
    "Software",
];

/// Extensions picked up by folder scans (compared case-insensitively)
pub const DEFAULT_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "bmp", "heic", "heif", "tif", "tiff", "webp",
];

/// Folder scan settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Lowercase file extensions without the dot
    pub extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

/// Build a report from an already loaded mapping.
///
/// Pipeline stages:
/// 1. Normalizer - Normalize the important and identifying fields
/// 2. gps - Decode the GPS block
/// 3. PrivacyClassifier - Score the mapping
pub fn analyze_mapping(file: impl AsRef<Path>, mapping: &MetadataMapping) -> ImageReport {
    let fields = IMPORTANT_FIELDS
        .iter()
        .chain(SENSITIVE_TAGS.iter())
        .filter_map(|name| {
            mapping
                .get(name)
                .map(|value| (name.to_string(), Normalizer::normalize(value)))
        })
        .collect();

    ImageReport {
        file: file.as_ref().to_path_buf(),
        has_metadata: !mapping.is_empty(),
        fields,
        gps: gps_report(mapping),
        privacy: PrivacyClassifier::classify(mapping),
        all_fields: None,
    }
}

/// Load and analyze a single image with the default EXIF source
pub fn analyze_file(path: impl AsRef<Path>) -> Result<ImageReport, MetadataError> {
    MetadataProcessor::new().analyze(path.as_ref())
}

/// Scan a folder with the default EXIF source
pub fn scan_folder(folder: impl AsRef<Path>, options: &ScanOptions) -> Result<BulkReport, MetadataError> {
    MetadataProcessor::with_options(options.clone()).scan(folder.as_ref())
}

/// Processor holding a metadata source and scan settings.
pub struct MetadataProcessor {
    source: Box<dyn MetadataSource>,
    options: ScanOptions,
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProcessor {
    /// Create a processor with the kamadak-exif source and default options
    pub fn new() -> Self {
        Self::with_options(ScanOptions::default())
    }

    pub fn with_options(options: ScanOptions) -> Self {
        Self {
            source: Box::new(KamadakSource),
            options,
        }
    }

    /// Use a different metadata source
    pub fn with_source(source: Box<dyn MetadataSource>, options: ScanOptions) -> Self {
        Self { source, options }
    }

    /// Analyze one image
    pub fn analyze(&self, path: &Path) -> Result<ImageReport, MetadataError> {
        let mapping = self.load(path)?;
        Ok(analyze_mapping(path, &mapping))
    }

    /// Analyze one image, keeping every normalized field in `all_fields`
    pub fn analyze_full(&self, path: &Path) -> Result<ImageReport, MetadataError> {
        let mapping = self.load(path)?;
        let mut report = analyze_mapping(path, &mapping);
        report.all_fields = Some(Normalizer::normalize_mapping(&mapping));
        Ok(report)
    }

    fn load(&self, path: &Path) -> Result<MetadataMapping, MetadataError> {
        let mapping = self.source.load(path)?;
        tracing::debug!(file = %path.display(), fields = mapping.len(), "metadata loaded");
        Ok(mapping)
    }

    /// Analyze every matching image in a folder, in sorted path order.
    ///
    /// Files and directory entries that cannot be read are logged and counted
    /// as failed. Symbolic links are not followed.
    pub fn scan(&self, folder: &Path) -> Result<BulkReport, MetadataError> {
        if !folder.is_dir() {
            return Err(MetadataError::NotADirectory(folder.to_path_buf()));
        }

        let mut summary = BulkSummary::default();
        let paths = self.collect(folder, &mut summary);
        let mut images = Vec::with_capacity(paths.len());

        for path in paths {
            match self.analyze_full(&path) {
                Ok(report) => {
                    summary.images += 1;
                    if !report.has_metadata {
                        summary.without_metadata += 1;
                    }
                    if report.gps.status.coordinate().is_some() {
                        summary.with_gps += 1;
                    }
                    match report.privacy.level {
                        RiskLevel::High => summary.high_risk += 1,
                        RiskLevel::Medium => summary.medium_risk += 1,
                        RiskLevel::Low => summary.low_risk += 1,
                    }
                    images.push(report);
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            folder = %folder.display(),
            images = summary.images,
            failed = summary.failed,
            "folder scanned"
        );

        Ok(BulkReport {
            folder: folder.to_path_buf(),
            generated_at_utc: Utc::now().to_rfc3339(),
            summary,
            images,
        })
    }

    fn collect(&self, folder: &Path, summary: &mut BulkSummary) -> Vec<PathBuf> {
        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(folder).follow_links(false).max_depth(max_depth);

        let mut paths = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.options.matches(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    summary.failed += 1;
                }
            }
        }
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{jpeg_with_app1, jpeg_without_metadata, TiffBuilder};
    use crate::encoder::ReportEncoder;
    use crate::types::{FieldValue, GpsStatus, RawValue, Rational};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn camera_tiff() -> Vec<u8> {
        TiffBuilder::new()
            .ascii(0x010F, "Canon")
            .ascii(0x0110, "EOS R5")
            .ascii(0x8298, "ACME Photo")
            .gps_ascii(0x0001, "N")
            .gps_rationals(0x0002, &[(40, 1), (42, 1), (51, 1)])
            .gps_ascii(0x0003, "W")
            .gps_rationals(0x0004, &[(74, 1), (0, 1), (21, 1)])
            .build()
    }

    #[test]
    fn test_analyze_mapping_fields_in_display_order() {
        let mapping: MetadataMapping = vec![
            ("Software", RawValue::text("GIMP 2.10")),
            ("FNumber", RawValue::Rational(Rational::new(28, 10))),
            ("ExposureTime", RawValue::Rational(Rational::new(1, 0))),
            ("Orientation", RawValue::Integers(vec![1])),
            ("Artist", RawValue::text("Jane")),
        ]
        .into_iter()
        .collect();

        let report = analyze_mapping("a.jpg", &mapping);
        assert_eq!(
            report.fields,
            vec![
                ("ExposureTime".to_string(), FieldValue::Invalid),
                ("FNumber".to_string(), FieldValue::Number(2.8)),
                ("Software".to_string(), FieldValue::Text("GIMP 2.10".to_string())),
                ("Artist".to_string(), FieldValue::Text("Jane".to_string())),
            ]
        );
        assert_eq!(report.gps.status, GpsStatus::Absent);
        assert_eq!(report.privacy.score, 3);
        assert!(report.has_metadata);
    }

    #[test]
    fn test_analyze_empty_mapping() {
        let report = analyze_mapping("empty.jpg", &MetadataMapping::new());
        assert!(!report.has_metadata);
        assert!(report.fields.is_empty());
        assert_eq!(report.privacy.level, RiskLevel::Low);
        assert_eq!(report.privacy.reasons, vec!["No EXIF metadata present".to_string()]);
    }

    #[test]
    fn test_analyze_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nyc.jpg");
        fs::write(&path, jpeg_with_app1(&camera_tiff())).unwrap();

        let report = analyze_file(&path).unwrap();
        assert_eq!(report.field("Make"), Some(&FieldValue::Text("Canon".to_string())));
        assert_eq!(report.privacy.score, 10);
        assert_eq!(report.privacy.level, RiskLevel::High);
        assert!(report.gps.maps_url.is_some());
    }

    #[test]
    fn test_scan_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.JPG"), jpeg_with_app1(&camera_tiff())).unwrap();
        fs::write(dir.path().join("a.jpg"), jpeg_without_metadata()).unwrap();
        fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.jpeg"), jpeg_without_metadata()).unwrap();

        let report = scan_folder(dir.path(), &ScanOptions::default()).unwrap();
        let names: Vec<String> = report
            .images
            .iter()
            .map(|r| r.file.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg".to_string(), "b.JPG".to_string()]);
        assert_eq!(
            report.summary,
            BulkSummary {
                images: 2,
                without_metadata: 1,
                with_gps: 1,
                high_risk: 1,
                medium_risk: 0,
                low_risk: 1,
                failed: 0,
            }
        );

        let options = ScanOptions {
            recursive: true,
            ..ScanOptions::default()
        };
        let report = scan_folder(dir.path(), &options).unwrap();
        assert_eq!(report.summary.images, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_symlink_loops() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), jpeg_without_metadata()).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink("..", dir.path().join("sub").join("up")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.jpg"), dir.path().join("sub").join("b.jpg"))
            .unwrap();

        let options = ScanOptions {
            recursive: true,
            ..ScanOptions::default()
        };
        let report = scan_folder(dir.path(), &options).unwrap();
        assert_eq!(report.summary.images, 1);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.images.len(), 1);
    }

    #[test]
    fn test_bulk_report_carries_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("nyc.jpg"), jpeg_with_app1(&camera_tiff())).unwrap();
        fs::write(dir.path().join("plain.jpg"), jpeg_without_metadata()).unwrap();

        let report = scan_folder(dir.path(), &ScanOptions::default()).unwrap();
        let all_fields = report.images[0].all_fields.as_ref().unwrap();
        assert!(all_fields.contains(&("Copyright".to_string(), FieldValue::Text("ACME Photo".to_string()))));
        assert!(all_fields.iter().any(|(name, _)| name == "GPSLatitude"));
        assert_eq!(report.images[1].all_fields, Some(Vec::new()));

        let json: serde_json::Value =
            serde_json::from_str(&ReportEncoder::bulk_to_json(&report).unwrap()).unwrap();
        assert_eq!(json["images"][0]["all_fields"]["Make"], "Canon");
        assert_eq!(json["images"][0]["all_fields"]["GPSLatitudeRef"], "N");

        // Single-image reports stay compact
        let single = analyze_file(dir.path().join("nyc.jpg")).unwrap();
        assert_eq!(single.all_fields, None);
        let json: serde_json::Value =
            serde_json::from_str(&ReportEncoder::to_json(&single).unwrap()).unwrap();
        assert!(json.get("all_fields").is_none());
    }

    #[test]
    fn test_scan_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = scan_folder(file.path(), &ScanOptions::default());
        assert!(matches!(result, Err(MetadataError::NotADirectory(_))));
    }

    struct FailingSource;

    impl MetadataSource for FailingSource {
        fn load(&self, _path: &Path) -> Result<MetadataMapping, MetadataError> {
            Err(MetadataError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }
    }

    #[test]
    fn test_scan_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), jpeg_without_metadata()).unwrap();

        let processor = MetadataProcessor::with_source(Box::new(FailingSource), ScanOptions::default());
        let report = processor.scan(dir.path()).unwrap();
        assert!(report.images.is_empty());
        assert_eq!(report.summary.failed, 1);
    }

    #[test]
    fn test_extension_filter() {
        let options = ScanOptions::default();
        assert!(options.matches(Path::new("x/IMG_0001.HEIC")));
        assert!(options.matches(Path::new("scan.tiff")));
        assert!(!options.matches(Path::new("clip.mov")));
        assert!(!options.matches(Path::new("README")));
    }
}
