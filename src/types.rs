//! Core types for the metascrub pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw EXIF values, normalized field values, GPS fixes and decoded
//! coordinates, privacy assessments, and the per-image and bulk reports.

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// EXIF rational: a numerator/denominator pair.
///
/// Both the unsigned and signed EXIF rational kinds fit in `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    pub const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Floating value, or `None` when the denominator is zero.
    pub fn to_f64(&self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }
}

impl From<(i64, i64)> for Rational {
    fn from((num, den): (i64, i64)) -> Self {
        Self { num, den }
    }
}

/// Raw EXIF value as produced by a metadata source
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// ASCII or undefined byte string
    Text(Vec<u8>),
    /// A single rational
    Rational(Rational),
    /// Several rationals (GPS angles, GPS time stamps, lens specs)
    RationalList(Vec<Rational>),
    /// BYTE / SHORT / LONG and their signed kinds
    Integers(Vec<i64>),
    /// FLOAT / DOUBLE
    Floats(Vec<f64>),
}

impl RawValue {
    pub fn text(s: &str) -> Self {
        RawValue::Text(s.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawValue::Text(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Rationals held by this value, whether single or listed
    pub fn rationals(&self) -> Option<&[Rational]> {
        match self {
            RawValue::Rational(r) => Some(std::slice::from_ref(r)),
            RawValue::RationalList(list) => Some(list),
            _ => None,
        }
    }
}

/// Field-name to raw value mapping, in the order the source produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMapping {
    entries: Vec<(String, RawValue)>,
}

impl MetadataMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing the value of an existing field of the same name
    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Insert only if the field is not present yet. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: RawValue) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value));
        true
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for MetadataMapping {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        let mut mapping = MetadataMapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// Normalized field value, ready for display or export
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Integer(i64),
    /// Unrepresentable value (rational with a zero denominator)
    Invalid,
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldValue::Invalid)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Invalid => f.write_str("Invalid"),
            FieldValue::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Invalid => serializer.serialize_str("Invalid"),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// Degrees, minutes, seconds
pub type Dms = [Rational; 3];

/// Hemisphere reference bytes exactly as found in the metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HemisphereRef(pub Vec<u8>);

impl HemisphereRef {
    pub fn new(s: &str) -> Self {
        HemisphereRef(s.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// How a hemisphere reference was interpreted for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HemisphereSign {
    /// Canonical positive reference ("N" or "E")
    Positive,
    /// Canonical negative reference ("S" or "W")
    Negative,
    /// Anything else; treated as the negative hemisphere
    Unrecognized,
}

impl HemisphereSign {
    pub fn multiplier(&self) -> f64 {
        match self {
            HemisphereSign::Positive => 1.0,
            HemisphereSign::Negative | HemisphereSign::Unrecognized => -1.0,
        }
    }
}

/// The four GPS fields a coordinate decode needs
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub latitude: Dms,
    pub latitude_ref: HemisphereRef,
    pub longitude: Dms,
    pub longitude_ref: HemisphereRef,
}

/// Signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecimalCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Result of decoding a [`GpsFix`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpsDecode {
    Located(DecimalCoordinate),
    /// At least one DMS component was unrepresentable
    Undecidable,
}

impl GpsDecode {
    pub fn coordinate(&self) -> Option<DecimalCoordinate> {
        match self {
            GpsDecode::Located(c) => Some(*c),
            GpsDecode::Undecidable => None,
        }
    }
}

/// GPS state of a whole mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GpsStatus {
    /// One or more of the required GPS fields is missing
    Absent,
    /// GPS fields are present but corrupted
    Undecidable,
    Located {
        latitude: f64,
        longitude: f64,
    },
}

impl GpsStatus {
    pub fn coordinate(&self) -> Option<DecimalCoordinate> {
        match self {
            GpsStatus::Located {
                latitude,
                longitude,
            } => Some(DecimalCoordinate {
                latitude: *latitude,
                longitude: *longitude,
            }),
            _ => None,
        }
    }
}

impl From<GpsDecode> for GpsStatus {
    fn from(decode: GpsDecode) -> Self {
        match decode {
            GpsDecode::Located(c) => GpsStatus::Located {
                latitude: c.latitude,
                longitude: c.longitude,
            },
            GpsDecode::Undecidable => GpsStatus::Undecidable,
        }
    }
}

/// Discrete privacy risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a privacy classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyAssessment {
    /// Score in 0..=10
    pub score: u8,
    pub level: RiskLevel,
    /// One reason per contributing signal, in evaluation order
    pub reasons: Vec<String>,
}

/// GPS section of an image report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsReport {
    #[serde(flatten)]
    pub status: GpsStatus,
    /// Altitude in meters, `Invalid` when the rational is unrepresentable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
}

impl GpsReport {
    pub fn absent() -> Self {
        Self {
            status: GpsStatus::Absent,
            altitude_m: None,
            gps_date: None,
            gps_time: None,
            maps_url: None,
        }
    }
}

/// Report for a single image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageReport {
    pub file: PathBuf,
    /// Whether the source produced any metadata at all
    pub has_metadata: bool,
    /// Important fields, normalized, in display order
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(String, FieldValue)>,
    pub gps: GpsReport,
    pub privacy: PrivacyAssessment,
    /// Every field of the mapping, normalized, in source order (bulk scans only)
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_all_fields"
    )]
    pub all_fields: Option<Vec<(String, FieldValue)>>,
}

impl ImageReport {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_fields<S: Serializer>(
    fields: &Vec<(String, FieldValue)>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (name, value) in fields {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

fn serialize_all_fields<S: Serializer>(
    fields: &Option<Vec<(String, FieldValue)>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match fields {
        Some(fields) => serialize_fields(fields, serializer),
        None => serializer.serialize_none(),
    }
}

/// Totals over a bulk scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub images: usize,
    pub without_metadata: usize,
    pub with_gps: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    /// Files that matched the filter but could not be read
    pub failed: usize,
}

/// Consolidated report over a folder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkReport {
    pub folder: PathBuf,
    pub generated_at_utc: String,
    pub summary: BulkSummary,
    pub images: Vec<ImageReport>,
}
