use std::fmt;
use std::fs::File;
use std::path::{
    Path,
    PathBuf,
};

use csv::{
    QuoteStyle,
    Terminator,
    Writer,
    WriterBuilder,
};
use tracing::debug;

use super::{
    with_suffix,
    OutputSink,
    RowOutcome,
};
use crate::codec::truncate_for_spreadsheet;
use crate::config::CsvDelimiter;
use crate::error::{
    ConvertError,
    Result,
};
use crate::models::{
    Column,
    FieldValue,
    MISSING_BLOB,
};

pub const CSV_SUFFIX: &str = ".csv";

/// Spreadsheet-friendly CSV, one line per record.
pub struct CsvOutput {
    delimiter: CsvDelimiter,
    writer: Option<Writer<File>>,
    header: Vec<&'static str>,
    row: Vec<String>,
    path: Option<PathBuf>,
}

impl CsvOutput {
    pub fn new(delimiter: CsvDelimiter) -> Self {
        Self {
            delimiter,
            writer: None,
            header: Vec::with_capacity(Column::ALL.len()),
            row: Vec::with_capacity(Column::ALL.len()),
            path: None,
        }
    }

    fn writer(&mut self) -> Result<&mut Writer<File>> {
        self.writer.as_mut().ok_or(ConvertError::NotOpened("csv"))
    }

    fn render(value: FieldValue<'_>) -> String {
        match value {
            FieldValue::Text(text) => text.to_string(),
            FieldValue::Blob(None) => MISSING_BLOB.to_string(),
            FieldValue::Blob(Some(blob)) => truncate_for_spreadsheet(&blob.decode()),
        }
    }
}

impl fmt::Debug for CsvOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvOutput")
            .field("delimiter", &self.delimiter)
            .field("open", &self.writer.is_some())
            .field("path", &self.path)
            .finish()
    }
}

impl OutputSink for CsvOutput {
    fn open_output(&mut self, base: &Path) -> Result<()> {
        let path = with_suffix(base, CSV_SUFFIX);
        let file = File::create(&path).map_err(|e| ConvertError::io(&path, e))?;

        self.writer = Some(
            WriterBuilder::new()
                .delimiter(self.delimiter.as_byte())
                .terminator(Terminator::CRLF)
                .quote_style(QuoteStyle::Necessary)
                .from_writer(file),
        );
        debug!("Opened CSV output {}", path.display());
        self.path = Some(path);
        Ok(())
    }

    fn begin_header(&mut self) -> Result<()> {
        self.header.clear();
        Ok(())
    }

    fn header_column(&mut self, column: Column) -> Result<()> {
        self.header.push(column.name());
        Ok(())
    }

    fn end_header(&mut self) -> Result<()> {
        let header = std::mem::take(&mut self.header);
        self.writer()?.write_record(&header)?;
        self.header = header;
        Ok(())
    }

    fn begin_row(&mut self) -> Result<()> {
        self.row.clear();
        Ok(())
    }

    fn row_column(&mut self, _column: Column, value: FieldValue<'_>) -> Result<()> {
        self.row.push(Self::render(value));
        Ok(())
    }

    fn end_row(&mut self) -> Result<RowOutcome> {
        let row = std::mem::take(&mut self.row);
        self.writer()?.write_record(&row)?;
        self.row = row;
        Ok(RowOutcome::Written)
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()?;
        self.writer = None;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| ConvertError::io(self.path.clone().unwrap_or_default(), e))?;
        }
        Ok(())
    }

    fn artifacts(&self) -> &[PathBuf] {
        self.path.as_slice()
    }
}
