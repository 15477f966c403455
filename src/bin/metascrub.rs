//! metascrub CLI - Command-line interface for metascrub
//!
//! Commands:
//! - inspect: Report the metadata and privacy risk of one image
//! - scan: Consolidated report over a folder of images
//! - strip: Remove metadata from an image and compare before/after
//! - schema: Describe the report layout

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use metascrub::adapters::KamadakSource;
use metascrub::encoder::ReportEncoder;
use metascrub::pipeline::{MetadataProcessor, ScanOptions};
use metascrub::privacy::{HIGH_THRESHOLD, MAX_SCORE, MEDIUM_THRESHOLD};
use metascrub::strip::{strip_file, StripOutcome};
use metascrub::{MetadataError, METASCRUB_VERSION, PRODUCER_NAME};

/// metascrub - EXIF metadata inspection, privacy scoring and stripping
#[derive(Parser)]
#[command(name = "metascrub")]
#[command(version = METASCRUB_VERSION)]
#[command(about = "Audit and remove privacy-sensitive image metadata", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the metadata and privacy risk of one image
    Inspect {
        /// Image file
        file: PathBuf,

        /// Output format (default: text on a terminal, JSON otherwise)
        #[arg(long)]
        format: Option<ReportFormat>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Consolidated report over a folder of images
    Scan {
        /// Folder to scan
        folder: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Write the JSON report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a one-row-per-image CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Remove metadata from a JPEG, PNG or WebP image and compare before/after
    Strip {
        /// Image to clean
        input: PathBuf,

        /// Where to write the cleaned image
        #[arg(short, long)]
        output: PathBuf,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe the report layout
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Printable plain-text report
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Field,Value rows
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "metascrub=debug" } else { "metascrub=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<(), MetascrubCliError> {
    match cli.command {
        Commands::Inspect {
            file,
            format,
            output,
        } => cmd_inspect(&file, format, output.as_deref()),

        Commands::Scan {
            folder,
            recursive,
            output,
            csv,
        } => cmd_scan(&folder, recursive, output.as_deref(), csv.as_deref()),

        Commands::Strip {
            input,
            output,
            json,
        } => cmd_strip(&input, &output, json),

        Commands::Schema { json } => cmd_schema(json),
    }
}

fn cmd_inspect(
    file: &Path,
    format: Option<ReportFormat>,
    output: Option<&Path>,
) -> Result<(), MetascrubCliError> {
    if !file.is_file() {
        return Err(MetascrubCliError::NotAFile(file.to_path_buf()));
    }

    let report = MetadataProcessor::new().analyze(file)?;

    let format = format.unwrap_or_else(|| {
        if output.is_none() && atty::is(atty::Stream::Stdout) {
            ReportFormat::Text
        } else {
            ReportFormat::Json
        }
    });
    let rendered = match format {
        ReportFormat::Text => ReportEncoder::to_text(&report)?,
        ReportFormat::Json => ReportEncoder::to_json(&report)? + "\n",
        ReportFormat::JsonPretty => ReportEncoder::to_json_pretty(&report)? + "\n",
        ReportFormat::Csv => ReportEncoder::to_csv(&report),
    };

    write_output(output, &rendered)
}

fn cmd_scan(
    folder: &Path,
    recursive: bool,
    output: Option<&Path>,
    csv: Option<&Path>,
) -> Result<(), MetascrubCliError> {
    let options = ScanOptions {
        recursive,
        ..ScanOptions::default()
    };
    let report = MetadataProcessor::with_options(options).scan(folder)?;

    if let Some(csv_path) = csv {
        fs::write(csv_path, ReportEncoder::bulk_to_csv(&report))?;
        tracing::info!(path = %csv_path.display(), "CSV written");
    }

    let json = ReportEncoder::bulk_to_json(&report)? + "\n";
    write_output(output, &json)
}

fn cmd_strip(input: &Path, output: &Path, json: bool) -> Result<(), MetascrubCliError> {
    if input == output {
        return Err(MetascrubCliError::SameFile);
    }

    let outcome = strip_file(&KamadakSource, input, output)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_strip_summary(&outcome);
    }
    Ok(())
}

fn print_strip_summary(outcome: &StripOutcome) {
    println!("metascrub Strip Report");
    println!("======================");
    println!("Input:  {}", outcome.before.file.display());
    println!("Output: {}", outcome.after.file.display());
    println!("Format: {:?}", outcome.format);
    println!(
        "Removed {} segment(s), {} bytes",
        outcome.removed_segments, outcome.removed_bytes
    );
    println!();
    println!(
        "Risk before: {}/{} ({})",
        outcome.before.privacy.score, MAX_SCORE, outcome.before.privacy.level
    );
    println!(
        "Risk after:  {}/{} ({})",
        outcome.after.privacy.score, MAX_SCORE, outcome.after.privacy.level
    );
}

fn cmd_schema(json: bool) -> Result<(), MetascrubCliError> {
    let schema = SchemaInfo::current();

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        println!("Report Schema ({} {})", schema.producer, schema.version);
        println!();
        println!("Each image report contains:");
        for (name, description) in &schema.report_fields {
            println!("- {name}: {description}");
        }
        println!();
        println!("Privacy scoring:");
        for (signal, weight) in &schema.weights {
            println!("  +{weight} {signal}");
        }
        println!(
            "  Clamped to 0..={}; HIGH >= {}, MEDIUM >= {}, LOW otherwise",
            MAX_SCORE, HIGH_THRESHOLD, MEDIUM_THRESHOLD
        );
    }
    Ok(())
}

fn write_output(output: Option<&Path>, data: &str) -> Result<(), MetascrubCliError> {
    match output {
        Some(path) => {
            fs::write(path, data)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{data}"),
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct SchemaInfo {
    producer: &'static str,
    version: &'static str,
    report_fields: Vec<(&'static str, &'static str)>,
    weights: Vec<(&'static str, u8)>,
}

impl SchemaInfo {
    fn current() -> Self {
        use metascrub::privacy::{
            CAPTURE_TIME_WEIGHT, DEVICE_WEIGHT, GPS_WEIGHT, SENSITIVE_WEIGHT, SOFTWARE_WEIGHT,
        };

        Self {
            producer: PRODUCER_NAME,
            version: METASCRUB_VERSION,
            report_fields: vec![
                ("file", "path of the analyzed image"),
                ("has_metadata", "whether any EXIF metadata was found"),
                ("fields", "important fields, normalized; \"Invalid\" marks corrupted values"),
                ("gps.status", "absent | undecidable | located"),
                ("gps.latitude, gps.longitude", "signed decimal degrees when located"),
                ("gps.altitude_m, gps.gps_date, gps.gps_time", "optional GPS extras"),
                ("gps.maps_url", "map link when located"),
                ("privacy.score", "0..=10"),
                ("privacy.level", "LOW | MEDIUM | HIGH"),
                ("privacy.reasons", "one reason per contributing signal"),
                ("all_fields", "every EXIF field, normalized (folder scans only)"),
            ],
            weights: vec![
                ("exact GPS location", GPS_WEIGHT),
                ("camera make/model", DEVICE_WEIGHT),
                ("original capture time", CAPTURE_TIME_WEIGHT),
                ("editing software", SOFTWARE_WEIGHT),
                ("each sensitive identifier", SENSITIVE_WEIGHT),
            ],
        }
    }
}

// Error types

#[derive(Debug)]
enum MetascrubCliError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Metadata(MetadataError),
    NotAFile(PathBuf),
    SameFile,
}

impl From<std::io::Error> for MetascrubCliError {
    fn from(e: std::io::Error) -> Self {
        MetascrubCliError::Io(e)
    }
}

impl From<serde_json::Error> for MetascrubCliError {
    fn from(e: serde_json::Error) -> Self {
        MetascrubCliError::Json(e)
    }
}

impl From<MetadataError> for MetascrubCliError {
    fn from(e: MetadataError) -> Self {
        MetascrubCliError::Metadata(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MetascrubCliError> for CliError {
    fn from(e: MetascrubCliError) -> Self {
        match e {
            MetascrubCliError::Io(e) | MetascrubCliError::Metadata(MetadataError::Io(e)) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MetascrubCliError::Json(e) | MetascrubCliError::Metadata(MetadataError::JsonError(e)) => {
                CliError {
                    code: "JSON_ERROR".to_string(),
                    message: e.to_string(),
                    hint: None,
                }
            }
            MetascrubCliError::Metadata(e @ MetadataError::UnsupportedFormat(_)) => CliError {
                code: "UNSUPPORTED_FORMAT".to_string(),
                message: e.to_string(),
                hint: Some("Only JPEG, PNG and WebP files can be stripped".to_string()),
            },
            MetascrubCliError::Metadata(e @ MetadataError::MalformedImage(_)) => CliError {
                code: "MALFORMED_IMAGE".to_string(),
                message: e.to_string(),
                hint: Some("The file may be truncated or corrupted".to_string()),
            },
            MetascrubCliError::Metadata(e @ MetadataError::Format(_)) => CliError {
                code: "FORMAT_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MetascrubCliError::Metadata(e @ MetadataError::NotADirectory(_)) => CliError {
                code: "NOT_A_DIRECTORY".to_string(),
                message: e.to_string(),
                hint: Some("Pass a folder to 'metascrub scan'".to_string()),
            },
            MetascrubCliError::Metadata(e @ MetadataError::Exif(_)) => CliError {
                code: "EXIF_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MetascrubCliError::NotAFile(path) => CliError {
                code: "NOT_A_FILE".to_string(),
                message: format!("Not a file: {}", path.display()),
                hint: Some("Use 'metascrub scan' for folders".to_string()),
            },
            MetascrubCliError::SameFile => CliError {
                code: "SAME_FILE".to_string(),
                message: "Input and output paths are the same".to_string(),
                hint: Some("Write the cleaned image to a new path".to_string()),
            },
        }
    }
}
