//! GPS coordinate decoding
//!
//! Converts EXIF degree/minute/second rationals plus hemisphere references into
//! signed decimal degrees. A zero denominator anywhere in the six DMS components
//! makes the whole coordinate undecidable; no partial coordinate is produced.
//!
//! Hemisphere policy: latitude is positive only for the exact reference `N`,
//! longitude only for `E`. Every other reference (missing, malformed, not
//! decodable) is treated as the negative hemisphere.

use crate::normalizer::decode_text;
use crate::types::{
    DecimalCoordinate, Dms, FieldValue, GpsDecode, GpsFix, GpsReport, GpsStatus, HemisphereRef,
    HemisphereSign, MetadataMapping, RawValue,
};

pub const GPS_LATITUDE: &str = "GPSLatitude";
pub const GPS_LATITUDE_REF: &str = "GPSLatitudeRef";
pub const GPS_LONGITUDE: &str = "GPSLongitude";
pub const GPS_LONGITUDE_REF: &str = "GPSLongitudeRef";
pub const GPS_ALTITUDE: &str = "GPSAltitude";
pub const GPS_ALTITUDE_REF: &str = "GPSAltitudeRef";
pub const GPS_DATE_STAMP: &str = "GPSDateStamp";
pub const GPS_TIME_STAMP: &str = "GPSTimeStamp";

/// Axis of a coordinate, used to pick the canonical references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn canonical(&self) -> (&'static [u8], &'static [u8]) {
        match self {
            Axis::Latitude => (b"N", b"S"),
            Axis::Longitude => (b"E", b"W"),
        }
    }
}

/// Raw GPS block read from a mapping
enum GpsBlock {
    /// A required field is missing
    Incomplete,
    /// All fields present but a coordinate does not hold three rationals
    Malformed,
    Complete(GpsFix),
}

impl GpsFix {
    /// Build a fix from a mapping.
    ///
    /// Returns `None` when any of the four required fields is missing or a
    /// coordinate value is not a DMS triple.
    pub fn from_mapping(mapping: &MetadataMapping) -> Option<GpsFix> {
        match read_block(mapping) {
            GpsBlock::Complete(fix) => Some(fix),
            GpsBlock::Incomplete | GpsBlock::Malformed => None,
        }
    }
}

fn read_block(mapping: &MetadataMapping) -> GpsBlock {
    let (Some(lat), Some(lat_ref), Some(lon), Some(lon_ref)) = (
        mapping.get(GPS_LATITUDE),
        mapping.get(GPS_LATITUDE_REF),
        mapping.get(GPS_LONGITUDE),
        mapping.get(GPS_LONGITUDE_REF),
    ) else {
        return GpsBlock::Incomplete;
    };

    let (Some(latitude), Some(longitude)) = (dms(lat), dms(lon)) else {
        return GpsBlock::Malformed;
    };

    GpsBlock::Complete(GpsFix {
        latitude,
        latitude_ref: reference(lat_ref),
        longitude,
        longitude_ref: reference(lon_ref),
    })
}

fn dms(value: &RawValue) -> Option<Dms> {
    match value.rationals()? {
        [d, m, s, ..] => Some([*d, *m, *s]),
        _ => None,
    }
}

fn reference(value: &RawValue) -> HemisphereRef {
    // A non-text reference can never match a canonical letter
    HemisphereRef(value.as_bytes().map(<[u8]>::to_vec).unwrap_or_default())
}

/// Interpret a hemisphere reference for an axis
pub fn hemisphere_sign(reference: &HemisphereRef, axis: Axis) -> HemisphereSign {
    let (positive, negative) = axis.canonical();
    let bytes = reference.as_bytes();
    if bytes == positive {
        HemisphereSign::Positive
    } else if bytes == negative {
        HemisphereSign::Negative
    } else {
        HemisphereSign::Unrecognized
    }
}

/// Absolute decimal degrees of a DMS triple
pub fn dms_to_degrees(value: &Dms) -> Option<f64> {
    let degrees = value[0].to_f64()?;
    let minutes = value[1].to_f64()?;
    let seconds = value[2].to_f64()?;
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

/// Decode a GPS fix into signed decimal degrees
pub fn decode(fix: &GpsFix) -> GpsDecode {
    let (Some(lat), Some(lon)) = (
        dms_to_degrees(&fix.latitude),
        dms_to_degrees(&fix.longitude),
    ) else {
        return GpsDecode::Undecidable;
    };

    let lat_sign = signed_axis(&fix.latitude_ref, Axis::Latitude);
    let lon_sign = signed_axis(&fix.longitude_ref, Axis::Longitude);

    GpsDecode::Located(DecimalCoordinate {
        latitude: lat * lat_sign.multiplier(),
        longitude: lon * lon_sign.multiplier(),
    })
}

fn signed_axis(reference: &HemisphereRef, axis: Axis) -> HemisphereSign {
    let sign = hemisphere_sign(reference, axis);
    if sign == HemisphereSign::Unrecognized {
        tracing::warn!(
            axis = ?axis,
            reference = %String::from_utf8_lossy(reference.as_bytes()),
            "unrecognized GPS hemisphere reference, assuming negative hemisphere"
        );
    }
    sign
}

/// GPS state of a mapping: absent, undecidable or located
pub fn gps_status(mapping: &MetadataMapping) -> GpsStatus {
    match read_block(mapping) {
        GpsBlock::Incomplete => GpsStatus::Absent,
        GpsBlock::Malformed => GpsStatus::Undecidable,
        GpsBlock::Complete(fix) => decode(&fix).into(),
    }
}

/// Altitude in meters; below sea level when `GPSAltitudeRef` is 1
pub fn altitude(mapping: &MetadataMapping) -> Option<FieldValue> {
    let rational = *mapping.get(GPS_ALTITUDE)?.rationals()?.first()?;
    let Some(meters) = rational.to_f64() else {
        return Some(FieldValue::Invalid);
    };
    let below_sea_level = match mapping.get(GPS_ALTITUDE_REF) {
        Some(RawValue::Integers(v)) => v.first() == Some(&1),
        Some(RawValue::Text(bytes)) => bytes.first() == Some(&1),
        _ => false,
    };
    Some(FieldValue::Number(if below_sea_level { -meters } else { meters }))
}

/// GPS date stamp text (`YYYY:MM:DD`)
pub fn gps_date(mapping: &MetadataMapping) -> Option<String> {
    let bytes = mapping.get(GPS_DATE_STAMP)?.as_bytes()?;
    let text = decode_text(bytes);
    (!text.is_empty()).then_some(text)
}

/// GPS time stamp as `HH:MM:SS`, `Invalid` if a component is unrepresentable.
///
/// Hours and minutes are whole numbers. Fractional seconds keep up to two
/// decimals (`09.3`, `59.25`).
pub fn gps_time(mapping: &MetadataMapping) -> Option<String> {
    let parts = mapping.get(GPS_TIME_STAMP)?.rationals()?;
    let [h, m, s, ..] = parts else {
        return None;
    };
    let (Some(h), Some(m), Some(s)) = (h.to_f64(), m.to_f64(), s.to_f64()) else {
        return Some("Invalid".to_string());
    };
    Some(format!("{:02}:{:02}:{}", h as u32, m as u32, format_seconds(s)))
}

fn format_seconds(seconds: f64) -> String {
    let text = format!("{seconds:05.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Map link for a coordinate
pub fn maps_url(coordinate: &DecimalCoordinate) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        coordinate.latitude, coordinate.longitude
    )
}

/// Full GPS section of an image report
pub fn gps_report(mapping: &MetadataMapping) -> GpsReport {
    let status = gps_status(mapping);
    GpsReport {
        status,
        altitude_m: altitude(mapping),
        gps_date: gps_date(mapping),
        gps_time: gps_time(mapping),
        maps_url: status.coordinate().as_ref().map(maps_url),
    }
}
