//! Report encoding
//!
//! This module formats image and bulk reports for export:
//! - JSON (tree document, compact or pretty)
//! - CSV (flat `Field,Value` rows, or one row per image for bulk reports)
//! - Plain text (printable report)

use crate::error::MetadataError;
use crate::types::{BulkReport, FieldValue, GpsReport, GpsStatus, ImageReport};
use std::fmt::{self, Write};

/// Header row of a bulk CSV export
pub const BULK_CSV_HEADER: [&str; 7] = [
    "Image",
    "Make",
    "Model",
    "GPSLatitude",
    "GPSLongitude",
    "PrivacyRiskScore",
    "PrivacyRiskLevel",
];

/// Encoder for report exports
pub struct ReportEncoder;

impl ReportEncoder {
    pub fn to_json(report: &ImageReport) -> Result<String, MetadataError> {
        serde_json::to_string(report).map_err(MetadataError::JsonError)
    }

    pub fn to_json_pretty(report: &ImageReport) -> Result<String, MetadataError> {
        serde_json::to_string_pretty(report).map_err(MetadataError::JsonError)
    }

    pub fn bulk_to_json(report: &BulkReport) -> Result<String, MetadataError> {
        serde_json::to_string_pretty(report).map_err(MetadataError::JsonError)
    }

    /// Flat key/value view of a report, in export order
    pub fn flatten(report: &ImageReport) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = report
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();

        match report.gps.status {
            GpsStatus::Located {
                latitude,
                longitude,
            } => {
                rows.push(("GPSLatitude".to_string(), latitude.to_string()));
                rows.push(("GPSLongitude".to_string(), longitude.to_string()));
            }
            GpsStatus::Undecidable => {
                rows.push(("GPSLatitude".to_string(), FieldValue::Invalid.to_string()));
                rows.push(("GPSLongitude".to_string(), FieldValue::Invalid.to_string()));
            }
            GpsStatus::Absent => {}
        }
        if let Some(altitude) = &report.gps.altitude_m {
            rows.push(("GPSAltitude".to_string(), altitude.to_string()));
        }
        if let Some(date) = &report.gps.gps_date {
            rows.push(("GPSDateStamp".to_string(), date.clone()));
        }
        if let Some(time) = &report.gps.gps_time {
            rows.push(("GPSTimeStamp".to_string(), time.clone()));
        }
        if let Some(url) = &report.gps.maps_url {
            rows.push(("MapsUrl".to_string(), url.clone()));
        }

        rows.push((
            "PrivacyRiskScore".to_string(),
            report.privacy.score.to_string(),
        ));
        rows.push((
            "PrivacyRiskLevel".to_string(),
            report.privacy.level.to_string(),
        ));
        rows.push((
            "PrivacyRiskReasons".to_string(),
            report.privacy.reasons.join("; "),
        ));
        rows
    }

    /// `Field,Value` CSV of a single report
    pub fn to_csv(report: &ImageReport) -> String {
        let mut out = String::new();
        push_row(&mut out, &["Field", "Value"]);
        for (name, value) in Self::flatten(report) {
            push_row(&mut out, &[&name, &value]);
        }
        out
    }

    /// One CSV row per image
    pub fn bulk_to_csv(report: &BulkReport) -> String {
        let mut out = String::new();
        push_row(&mut out, &BULK_CSV_HEADER);

        for image in &report.images {
            let name = image
                .file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| image.file.display().to_string());
            let field = |key: &str| image.field(key).map(|v| v.to_string()).unwrap_or_default();
            let (lat, lon) = match image.gps.status {
                GpsStatus::Located {
                    latitude,
                    longitude,
                } => (latitude.to_string(), longitude.to_string()),
                _ => (String::new(), String::new()),
            };

            push_row(
                &mut out,
                &[
                    &name,
                    &field("Make"),
                    &field("Model"),
                    &lat,
                    &lon,
                    &image.privacy.score.to_string(),
                    image.privacy.level.as_str(),
                ],
            );
        }
        out
    }

    /// Printable plain-text report
    pub fn to_text(report: &ImageReport) -> Result<String, MetadataError> {
        let mut out = String::new();
        write_text(&mut out, report)?;
        Ok(out)
    }
}

fn write_text(out: &mut String, report: &ImageReport) -> fmt::Result {
    writeln!(out, "EXIF METADATA REPORT")?;
    writeln!(out, "====================")?;
    writeln!(out, "File: {}", report.file.display())?;
    writeln!(out)?;

    if !report.has_metadata {
        writeln!(out, "No EXIF metadata found.")?;
    } else {
        writeln!(out, "IMPORTANT METADATA")?;
        for (name, value) in &report.fields {
            writeln!(out, "  {name:24}: {value}")?;
        }
        writeln!(out)?;

        writeln!(out, "GPS METADATA")?;
        write_gps(out, &report.gps)?;
    }
    writeln!(out)?;

    writeln!(out, "PRIVACY RISK")?;
    writeln!(
        out,
        "  Score: {}/10 ({})",
        report.privacy.score, report.privacy.level
    )?;
    for reason in &report.privacy.reasons {
        writeln!(out, "  - {reason}")?;
    }
    Ok(())
}

fn write_gps(out: &mut String, gps: &GpsReport) -> fmt::Result {
    let GpsStatus::Located {
        latitude,
        longitude,
    } = gps.status
    else {
        return match gps.status {
            GpsStatus::Undecidable => {
                writeln!(out, "  GPS metadata exists but is incomplete or corrupted")
            }
            _ => writeln!(out, "  No GPS metadata"),
        };
    };

    writeln!(out, "  {:24}: {latitude}", "Latitude")?;
    writeln!(out, "  {:24}: {longitude}", "Longitude")?;
    match &gps.altitude_m {
        Some(altitude) if altitude.is_invalid() => {
            writeln!(out, "  {:24}: Invalid (corrupted EXIF value)", "Altitude")?
        }
        Some(altitude) => writeln!(out, "  {:24}: {altitude} m", "Altitude")?,
        None => {}
    }
    if let Some(date) = &gps.gps_date {
        writeln!(out, "  {:24}: {date}", "GPS Date")?;
    }
    if let Some(time) = &gps.gps_time {
        writeln!(out, "  {:24}: {time}", "GPS Time")?;
    }
    if let Some(url) = &gps.maps_url {
        writeln!(out, "  {:24}: {url}", "Map")?;
    }
    Ok(())
}

fn push_row(out: &mut String, cells: &[&str]) {
    let row: Vec<String> = cells.iter().map(|c| escape_csv(c)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Quote a CSV cell when it holds a separator, quote or line break
fn escape_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
