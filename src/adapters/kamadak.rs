//! kamadak-exif source adapter
//!
//! Reads EXIF attributes from JPEG, TIFF, HEIF, PNG and WebP containers (or a
//! bare TIFF payload) and maps every field to a [`RawValue`].

use crate::error::MetadataError;
use crate::types::{MetadataMapping, Rational, RawValue};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::MetadataSource;

/// Metadata source backed by `kamadak-exif`
#[derive(Debug, Clone, Copy, Default)]
pub struct KamadakSource;

impl MetadataSource for KamadakSource {
    fn load(&self, path: &Path) -> Result<MetadataMapping, MetadataError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let result = exif::Reader::new()
            .continue_on_error(true)
            .read_from_container(&mut reader);

        Ok(mapping_or_empty(result, &path.display().to_string()))
    }
}

impl KamadakSource {
    /// Parse a bare TIFF/EXIF payload (no image container around it)
    pub fn load_raw_tiff(&self, data: Vec<u8>) -> MetadataMapping {
        let result = exif::Reader::new().continue_on_error(true).read_raw(data);
        mapping_or_empty(result, "<raw tiff>")
    }
}

/// Unparsable sources degrade to an empty mapping
fn mapping_or_empty(result: Result<exif::Exif, exif::Error>, origin: &str) -> MetadataMapping {
    match result {
        Ok(exif) => to_mapping(&exif),
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            tracing::warn!(
                source = origin,
                errors = errors.len(),
                "EXIF partially read, keeping readable fields"
            );
            to_mapping(&exif)
        }
        Err(exif::Error::NotFound(_)) => {
            tracing::debug!(source = origin, "no EXIF data found");
            MetadataMapping::new()
        }
        Err(e) => {
            tracing::warn!(source = origin, error = %e, "cannot parse EXIF data");
            MetadataMapping::new()
        }
    }
}

fn to_mapping(exif: &exif::Exif) -> MetadataMapping {
    let mut mapping = MetadataMapping::new();
    let mut thumbnail_fields = Vec::new();

    for field in exif.fields() {
        if is_ifd_pointer(field.tag) {
            continue;
        }
        if field.ifd_num == exif::In::PRIMARY {
            mapping.insert(field.tag.to_string(), convert_value(&field.value));
        } else {
            thumbnail_fields.push(field);
        }
    }

    // Primary image fields win over thumbnail fields of the same name
    for field in thumbnail_fields {
        mapping.insert_if_absent(field.tag.to_string(), convert_value(&field.value));
    }

    mapping
}

fn is_ifd_pointer(tag: exif::Tag) -> bool {
    tag == exif::Tag::ExifIFDPointer
        || tag == exif::Tag::GPSInfoIFDPointer
        || tag == exif::Tag::InteropIFDPointer
}

fn convert_value(value: &exif::Value) -> RawValue {
    match value {
        exif::Value::Ascii(strings) => {
            RawValue::Text(strings.first().cloned().unwrap_or_default())
        }
        exif::Value::Undefined(bytes, _) => RawValue::Text(bytes.clone()),
        exif::Value::Byte(v) => RawValue::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        exif::Value::SByte(v) => RawValue::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        exif::Value::Short(v) => RawValue::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        exif::Value::SShort(v) => RawValue::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        exif::Value::Long(v) => RawValue::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        exif::Value::SLong(v) => RawValue::Integers(v.iter().map(|x| i64::from(*x)).collect()),
        exif::Value::Rational(v) => rationals(
            v.iter()
                .map(|r| Rational::new(i64::from(r.num), i64::from(r.denom)))
                .collect(),
        ),
        exif::Value::SRational(v) => rationals(
            v.iter()
                .map(|r| Rational::new(i64::from(r.num), i64::from(r.denom)))
                .collect(),
        ),
        exif::Value::Float(v) => RawValue::Floats(v.iter().map(|x| f64::from(*x)).collect()),
        exif::Value::Double(v) => RawValue::Floats(v.clone()),
        _ => RawValue::Text(Vec::new()),
    }
}

fn rationals(mut list: Vec<Rational>) -> RawValue {
    if list.len() == 1 {
        RawValue::Rational(list.remove(0))
    } else {
        RawValue::RationalList(list)
    }
}
