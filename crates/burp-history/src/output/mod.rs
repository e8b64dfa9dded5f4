pub mod csv;
pub mod html;
pub mod json;

use std::path::{
    Path,
    PathBuf,
};

pub use self::csv::CsvOutput;
pub use self::html::HtmlOutput;
pub use self::json::JsonSplitOutput;
use crate::config::{
    ConvertConfig,
    OutputFormat,
};
use crate::error::Result;
use crate::models::{
    Column,
    FieldValue,
};

/// Result of closing a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Written,
    Skipped,
}

/// The header/rows/footer protocol every output format follows.
///
/// The converter calls, in order: `open_output`, `begin_header`,
/// `header_column` once per column, `end_header`, then for every record
/// `begin_row`, `row_column` once per column, `end_row`, and finally
/// `finish`.
pub trait OutputSink {
    fn open_output(&mut self, base: &Path) -> Result<()>;

    fn begin_header(&mut self) -> Result<()>;

    fn header_column(&mut self, column: Column) -> Result<()>;

    fn end_header(&mut self) -> Result<()>;

    fn begin_row(&mut self) -> Result<()>;

    /// Blob values arrive still encoded; each format decodes them itself.
    fn row_column(&mut self, column: Column, value: FieldValue<'_>) -> Result<()>;

    fn end_row(&mut self) -> Result<RowOutcome>;

    fn finish(&mut self) -> Result<()>;

    /// Pushes buffered output to disk without closing the document. Used
    /// when a run is aborted halfway.
    fn flush(&mut self) -> Result<()>;

    /// Files produced so far.
    fn artifacts(&self) -> &[PathBuf];
}

#[derive(Debug)]
pub enum OutputStrategy {
    Csv(CsvOutput),
    Html(HtmlOutput),
    Json(JsonSplitOutput),
}

impl OutputStrategy {
    pub fn from_config(config: &ConvertConfig) -> Self {
        match config.format() {
            OutputFormat::Csv => OutputStrategy::Csv(CsvOutput::new(config.csv_delimiter())),
            OutputFormat::Html => OutputStrategy::Html(HtmlOutput::new()),
            OutputFormat::Json => {
                OutputStrategy::Json(JsonSplitOutput::new(config.malformed_policy()))
            }
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            OutputStrategy::Csv(_) => OutputFormat::Csv,
            OutputStrategy::Html(_) => OutputFormat::Html,
            OutputStrategy::Json(_) => OutputFormat::Json,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $sink:ident => $call:expr) => {
        match $self {
            OutputStrategy::Csv($sink) => $call,
            OutputStrategy::Html($sink) => $call,
            OutputStrategy::Json($sink) => $call,
        }
    };
}

impl OutputSink for OutputStrategy {
    fn open_output(&mut self, base: &Path) -> Result<()> {
        dispatch!(self, sink => sink.open_output(base))
    }

    fn begin_header(&mut self) -> Result<()> {
        dispatch!(self, sink => sink.begin_header())
    }

    fn header_column(&mut self, column: Column) -> Result<()> {
        dispatch!(self, sink => sink.header_column(column))
    }

    fn end_header(&mut self) -> Result<()> {
        dispatch!(self, sink => sink.end_header())
    }

    fn begin_row(&mut self) -> Result<()> {
        dispatch!(self, sink => sink.begin_row())
    }

    fn row_column(&mut self, column: Column, value: FieldValue<'_>) -> Result<()> {
        dispatch!(self, sink => sink.row_column(column, value))
    }

    fn end_row(&mut self) -> Result<RowOutcome> {
        dispatch!(self, sink => sink.end_row())
    }

    fn finish(&mut self) -> Result<()> {
        dispatch!(self, sink => sink.finish())
    }

    fn flush(&mut self) -> Result<()> {
        dispatch!(self, sink => sink.flush())
    }

    fn artifacts(&self) -> &[PathBuf] {
        dispatch!(self, sink => sink.artifacts())
    }
}

/// Appends `suffix` to the file name of `base` without treating any dot
/// already in it as an extension.
pub(crate) fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
