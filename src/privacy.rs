//! Privacy risk classification
//!
//! Scores how much identifying information a metadata mapping carries. Each
//! signal is checked independently and adds to the score; reasons are appended
//! in a fixed evaluation order so the output is deterministic.
//!
//! | Signal | Score |
//! |---|---|
//! | Exact GPS location | +6 |
//! | Camera make/model | +2 |
//! | Original capture time | +1 |
//! | Editing software | +1 |
//! | Each sensitive identifier | +2 |
//!
//! The sum is clamped to 0..=10. Levels: 7+ HIGH, 4-6 MEDIUM, below 4 LOW.

use crate::gps::gps_status;
use crate::types::{GpsStatus, MetadataMapping, PrivacyAssessment, RawValue, RiskLevel};

/// Maximum score after clamping
pub const MAX_SCORE: u8 = 10;

pub const GPS_WEIGHT: u8 = 6;
pub const DEVICE_WEIGHT: u8 = 2;
pub const CAPTURE_TIME_WEIGHT: u8 = 1;
pub const SOFTWARE_WEIGHT: u8 = 1;
pub const SENSITIVE_WEIGHT: u8 = 2;

/// Minimum score for `HIGH`
pub const HIGH_THRESHOLD: u8 = 7;
/// Minimum score for `MEDIUM`
pub const MEDIUM_THRESHOLD: u8 = 4;

/// Identifier tags, in evaluation order
pub const SENSITIVE_TAGS: [&str; 5] = [
    "Artist",
    "OwnerName",
    "Copyright",
    "BodySerialNumber",
    "LensSerialNumber",
];

pub const NO_METADATA_REASON: &str = "No EXIF metadata present";

/// Presence of each privacy-relevant field in a mapping
#[derive(Debug, Clone)]
pub struct PrivacySignals<'a> {
    pub gps: GpsStatus,
    pub make: Option<&'a RawValue>,
    pub model: Option<&'a RawValue>,
    pub date_time_original: Option<&'a RawValue>,
    pub software: Option<&'a RawValue>,
    /// Sensitive identifiers found, in `SENSITIVE_TAGS` order
    pub sensitive: Vec<(&'static str, &'a RawValue)>,
}

impl<'a> PrivacySignals<'a> {
    pub fn from_mapping(mapping: &'a MetadataMapping) -> Self {
        Self {
            gps: gps_status(mapping),
            make: mapping.get("Make"),
            model: mapping.get("Model"),
            date_time_original: mapping.get("DateTimeOriginal"),
            software: mapping.get("Software"),
            sensitive: SENSITIVE_TAGS
                .iter()
                .filter_map(|tag| mapping.get(tag).map(|value| (*tag, value)))
                .collect(),
        }
    }
}

/// Classifier for metadata privacy risk
pub struct PrivacyClassifier;

impl PrivacyClassifier {
    /// Classify a mapping. Never fails; an empty mapping is LOW with score 0.
    pub fn classify(mapping: &MetadataMapping) -> PrivacyAssessment {
        if mapping.is_empty() {
            return PrivacyAssessment {
                score: 0,
                level: RiskLevel::Low,
                reasons: vec![NO_METADATA_REASON.to_string()],
            };
        }

        Self::score(&PrivacySignals::from_mapping(mapping))
    }

    /// Score extracted signals
    pub fn score(signals: &PrivacySignals<'_>) -> PrivacyAssessment {
        let mut score: u32 = 0;
        let mut reasons = Vec::new();

        if signals.gps.coordinate().is_some() {
            score += u32::from(GPS_WEIGHT);
            reasons.push("Exact GPS location present".to_string());
        }

        if signals.make.is_some() || signals.model.is_some() {
            score += u32::from(DEVICE_WEIGHT);
            reasons.push("Camera make/model present".to_string());
        }

        if signals.date_time_original.is_some() {
            score += u32::from(CAPTURE_TIME_WEIGHT);
            reasons.push("Original capture time present".to_string());
        }

        if signals.software.is_some() {
            score += u32::from(SOFTWARE_WEIGHT);
            reasons.push("Editing software identified".to_string());
        }

        for (tag, _) in &signals.sensitive {
            score += u32::from(SENSITIVE_WEIGHT);
            reasons.push(format!("Sensitive identifier: {tag}"));
        }

        let score = score.min(u32::from(MAX_SCORE)) as u8;

        PrivacyAssessment {
            score,
            level: level_for(score),
            reasons,
        }
    }
}

/// Convenience wrapper around [`PrivacyClassifier::classify`]
pub fn classify(mapping: &MetadataMapping) -> PrivacyAssessment {
    PrivacyClassifier::classify(mapping)
}

/// Risk level for a clamped score
pub fn level_for(score: u8) -> RiskLevel {
    if score >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
