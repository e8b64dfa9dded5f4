use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};

use tracing::debug;

use super::{
    with_suffix,
    OutputSink,
    RowOutcome,
};
use crate::codec::escape_html;
use crate::error::{
    ConvertError,
    Result,
};
use crate::models::{
    Column,
    FieldValue,
    MISSING_BLOB,
};

pub const HTML_SUFFIX: &str = ".html";

const DOCUMENT_HEADER: &str = r#"<!DOCTYPE html>
<html>
    <head>
    <title>Burp Suite proxy history</title>
    <style>
    table {
        border-collapse: collapse;
    }
    table, th, td {
        border: 1px solid black;
        font-family: Arial, sans-serif;
        padding: 5px;
    }
    th {
        text-align: left;
    }
    td {
        vertical-align: top;
    }
    </style>
    </head>
    <body>
        <table><thead><tr>"#;

const DOCUMENT_FOOTER: &str = "</tbody></table>\n</body></html>";

/// A single static page holding the whole history as one table.
#[derive(Debug, Default)]
pub struct HtmlOutput {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl HtmlOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(ConvertError::NotOpened("html"))?;
        if let Err(e) = writeln!(writer, "{line}") {
            return Err(ConvertError::io(self.path.clone().unwrap_or_default(), e));
        }
        Ok(())
    }

    fn render_cell(value: FieldValue<'_>) -> String {
        match value {
            FieldValue::Text(text) => format!("<td>{}</td>", escape_html(text)),
            FieldValue::Blob(None) => format!("<td><pre>{MISSING_BLOB}</pre></td>"),
            FieldValue::Blob(Some(blob)) => {
                format!("<td><pre>{}</pre></td>", escape_html(&blob.decode()))
            }
        }
    }
}

impl OutputSink for HtmlOutput {
    fn open_output(&mut self, base: &Path) -> Result<()> {
        let path = with_suffix(base, HTML_SUFFIX);
        let file = File::create(&path).map_err(|e| ConvertError::io(&path, e))?;

        self.writer = Some(BufWriter::new(file));
        debug!("Opened HTML output {}", path.display());
        self.path = Some(path);
        Ok(())
    }

    fn begin_header(&mut self) -> Result<()> {
        self.write_line(DOCUMENT_HEADER)
    }

    fn header_column(&mut self, column: Column) -> Result<()> {
        self.write_line(&format!("<th>{}</th>", column.name()))
    }

    fn end_header(&mut self) -> Result<()> {
        self.write_line("</tr></thead><tbody>")
    }

    fn begin_row(&mut self) -> Result<()> {
        self.write_line("<tr>")
    }

    fn row_column(&mut self, _column: Column, value: FieldValue<'_>) -> Result<()> {
        self.write_line(&Self::render_cell(value))
    }

    fn end_row(&mut self) -> Result<RowOutcome> {
        self.write_line("</tr>")?;
        Ok(RowOutcome::Written)
    }

    fn finish(&mut self) -> Result<()> {
        self.write_line(DOCUMENT_FOOTER)?;
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
