use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Html,
    Csv,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CsvDelimiter {
    #[default]
    #[value(name = ",")]
    Comma,
    #[value(name = ";")]
    Semicolon,
}

impl CsvDelimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            CsvDelimiter::Comma => b',',
            CsvDelimiter::Semicolon => b';',
        }
    }
}

/// What to do with a record whose request or response cannot be split into
/// start line, headers and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRecordPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Log a warning, write nothing for the record and keep going.
    Skip,
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    output_base: PathBuf,
    format: OutputFormat,
    csv_delimiter: CsvDelimiter,
    malformed_policy: MalformedRecordPolicy,
}

impl ConvertConfig {
    pub fn new(output_base: impl Into<PathBuf>) -> Self {
        Self {
            output_base: output_base.into(),
            format: OutputFormat::default(),
            csv_delimiter: CsvDelimiter::default(),
            malformed_policy: MalformedRecordPolicy::default(),
        }
    }

    pub fn builder(output_base: impl Into<PathBuf>) -> ConvertConfigBuilder {
        ConvertConfigBuilder::new(output_base)
    }

    pub fn output_base(&self) -> &Path {
        &self.output_base
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn csv_delimiter(&self) -> CsvDelimiter {
        self.csv_delimiter
    }

    pub fn malformed_policy(&self) -> MalformedRecordPolicy {
        self.malformed_policy
    }
}

#[derive(Debug)]
pub struct ConvertConfigBuilder {
    output_base: PathBuf,
    format: Option<OutputFormat>,
    csv_delimiter: Option<CsvDelimiter>,
    malformed_policy: Option<MalformedRecordPolicy>,
}

impl ConvertConfigBuilder {
    pub fn new(output_base: impl Into<PathBuf>) -> Self {
        Self {
            output_base: output_base.into(),
            format: None,
            csv_delimiter: None,
            malformed_policy: None,
        }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn csv_delimiter(mut self, delimiter: CsvDelimiter) -> Self {
        self.csv_delimiter = Some(delimiter);
        self
    }

    pub fn malformed_policy(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_policy = Some(policy);
        self
    }

    pub fn build(self) -> ConvertConfig {
        ConvertConfig {
            output_base: self.output_base,
            format: self.format.unwrap_or_default(),
            csv_delimiter: self.csv_delimiter.unwrap_or_default(),
            malformed_policy: self.malformed_policy.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::new("history.xml");

        assert_eq!(config.format(), OutputFormat::Html);
        assert_eq!(config.csv_delimiter(), CsvDelimiter::Comma);
        assert_eq!(config.malformed_policy(), MalformedRecordPolicy::Abort);
        assert_eq!(config.output_base(), Path::new("history.xml"));
    }

    #[test]
    fn test_builder() {
        let config = ConvertConfig::builder("out/history.xml")
            .format(OutputFormat::Csv)
            .csv_delimiter(CsvDelimiter::Semicolon)
            .malformed_policy(MalformedRecordPolicy::Skip)
            .build();

        assert_eq!(config.format(), OutputFormat::Csv);
        assert_eq!(config.output_base(), Path::new("out/history.xml"));
        assert_eq!(config.csv_delimiter().as_byte(), b';');
        assert_eq!(config.malformed_policy(), MalformedRecordPolicy::Skip);
    }

    #[test]
    fn test_parse_format_and_delimiter() {
        assert_eq!(OutputFormat::from_str("JSON", true), Ok(OutputFormat::Json));
        assert!(OutputFormat::from_str("xml", true).is_err());
        assert_eq!(OutputFormat::Csv.to_string(), "csv");

        assert_eq!(CsvDelimiter::from_str(";", false), Ok(CsvDelimiter::Semicolon));
        assert!(CsvDelimiter::from_str("|", false).is_err());
    }
}
