//! Field normalization
//!
//! This module turns raw EXIF value shapes into display values:
//! - Byte strings decoded to text, undecodable bytes dropped
//! - Rationals converted to floats, zero denominators marked `Invalid`
//! - Integer and float lists collapsed when they hold a single element

use crate::types::{FieldValue, MetadataMapping, RawValue, Rational};

/// Normalizer for converting raw values to field values
pub struct Normalizer;

impl Normalizer {
    /// Normalize a single raw value. Never fails.
    pub fn normalize(value: &RawValue) -> FieldValue {
        match value {
            RawValue::Text(bytes) => FieldValue::Text(decode_text(bytes)),
            RawValue::Rational(r) => normalize_rational(r),
            RawValue::RationalList(list) => {
                collapse(list.iter().map(normalize_rational).collect())
            }
            RawValue::Integers(values) => {
                collapse(values.iter().map(|v| FieldValue::Integer(*v)).collect())
            }
            RawValue::Floats(values) => {
                collapse(values.iter().map(|v| FieldValue::Number(*v)).collect())
            }
        }
    }

    /// Normalize every field of a mapping, keeping the mapping's order
    pub fn normalize_mapping(mapping: &MetadataMapping) -> Vec<(String, FieldValue)> {
        mapping
            .iter()
            .map(|(name, value)| (name.to_string(), Self::normalize(value)))
            .collect()
    }
}

/// Decode bytes as UTF-8, dropping invalid sequences and trailing NULs
pub fn decode_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text.trim_end_matches('\0').to_string()
}

fn normalize_rational(r: &Rational) -> FieldValue {
    match r.to_f64() {
        Some(v) => FieldValue::Number(v),
        None => FieldValue::Invalid,
    }
}

fn collapse(mut items: Vec<FieldValue>) -> FieldValue {
    if items.len() == 1 {
        items.remove(0)
    } else {
        FieldValue::List(items)
    }
}
