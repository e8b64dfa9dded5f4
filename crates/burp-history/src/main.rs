//! Converts a Burp Suite HTTP proxy history export to CSV, HTML or JSON.
//!
//! # Usage
//!
//! ```bash
//! # One HTML table, written to history.xml.html
//! burp-history history.xml
//!
//! # Semicolon separated CSV for spreadsheets
//! burp-history history.xml --format csv --csv-delimiter ';'
//!
//! # Three JSON files per record, skipping records that do not parse
//! burp-history history.xml --format json --skip-malformed
//! ```

use std::path::PathBuf;

use anyhow::Context;
use burp_history::{
    ConvertConfig,
    Converter,
    CsvDelimiter,
    MalformedRecordPolicy,
    OutputFormat,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Burp Suite HTTP proxy history converter
#[derive(Parser, Debug)]
#[command(
    name = "burp-history",
    version,
    about = "Converts Burp Suite HTTP proxy history files to CSV, HTML or JSON"
)]
struct Args {
    /// Burp Suite HTTP proxy history file
    filename: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "html")]
    format: OutputFormat,

    /// CSV delimiter
    #[arg(long, value_enum, default_value = ",")]
    csv_delimiter: CsvDelimiter,

    /// Skip records whose request or response cannot be parsed (json only)
    #[arg(long)]
    skip_malformed: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let malformed_policy = if args.skip_malformed {
        MalformedRecordPolicy::Skip
    } else {
        MalformedRecordPolicy::Abort
    };

    let config = ConvertConfig::builder(&args.filename)
        .format(args.format)
        .csv_delimiter(args.csv_delimiter)
        .malformed_policy(malformed_policy)
        .build();

    let summary = Converter::new(config)
        .convert_file(&args.filename)
        .with_context(|| format!("Failed to convert {}", args.filename.display()))?;

    println!(
        "Converted {} records ({} skipped) into {} files",
        summary.records,
        summary.skipped,
        summary.artifacts.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["burp-history", "history.xml"]).unwrap();

        assert_eq!(args.format, OutputFormat::Html);
        assert_eq!(args.csv_delimiter, CsvDelimiter::Comma);
        assert!(!args.skip_malformed);
    }

    #[test]
    fn test_args_parse_into_config_enums() {
        let args = Args::try_parse_from([
            "burp-history",
            "history.xml",
            "--format",
            "json",
            "--csv-delimiter",
            ";",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.csv_delimiter, CsvDelimiter::Semicolon);

        let bad_delimiter = ["burp-history", "history.xml", "--csv-delimiter", "|"];
        assert!(Args::try_parse_from(bad_delimiter).is_err());
    }
}
