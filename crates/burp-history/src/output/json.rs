use std::collections::BTreeMap;
use std::fs::File;
use std::io::{
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;
use tracing::{
    debug,
    warn,
};

use super::{
    with_suffix,
    OutputSink,
    RowOutcome,
};
use crate::config::MalformedRecordPolicy;
use crate::error::{
    ConvertError,
    Result,
};
use crate::models::{
    Blob,
    Column,
    FieldValue,
};
use crate::parser::{
    HttpMessageParser,
    ParsedHttpMessage,
};

pub const METADATA_SUFFIX: &str = ".json";

pub const REQUEST_SUFFIX: &str = ".req.json";

pub const RESPONSE_SUFFIX: &str = ".res.json";

/// Three JSON files per record: metadata, parsed request and parsed
/// response, correlated by a shared `<base>_<time>_<row>` stem.
#[derive(Debug)]
pub struct JsonSplitOutput {
    policy: MalformedRecordPolicy,
    base: Option<PathBuf>,
    row_index: usize,
    metadata: BTreeMap<&'static str, String>,
    request: Option<Blob>,
    response: Option<Blob>,
    artifacts: Vec<PathBuf>,
}

impl JsonSplitOutput {
    pub fn new(policy: MalformedRecordPolicy) -> Self {
        Self {
            policy,
            base: None,
            row_index: 0,
            metadata: BTreeMap::new(),
            request: None,
            response: None,
            artifacts: Vec::new(),
        }
    }

    pub fn row_index(&self) -> usize {
        self.row_index
    }

    /// Turns a capture timestamp into something safe to put in a file name.
    pub fn sanitize_timestamp(time: &str) -> String {
        time.chars()
            .filter(|c| *c != ':')
            .map(|c| match c {
                ' ' => '_',
                '/' | '\\' => '-',
                other => other,
            })
            .collect()
    }

    fn stem(&self, base: &Path) -> PathBuf {
        let time = self
            .metadata
            .get(Column::Time.name())
            .map(String::as_str)
            .unwrap_or_default();
        with_suffix(
            base,
            &format!("_{}_{}", Self::sanitize_timestamp(time), self.row_index),
        )
    }

    fn parse_blob(blob: Option<&Blob>) -> Result<ParsedHttpMessage> {
        match blob {
            Some(blob) => HttpMessageParser::parse(&blob.decode()),
            None => Ok(ParsedHttpMessage::default()),
        }
    }

    fn write_document<T: Serialize>(&mut self, path: PathBuf, document: &T) -> Result<()> {
        let value = serde_json::to_value(document)?;
        let file = File::create(&path).map_err(|e| ConvertError::io(&path, e))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &value)?;
        writer.flush().map_err(|e| ConvertError::io(&path, e))?;

        debug!("Wrote {}", path.display());
        self.artifacts.push(path);
        Ok(())
    }

    fn reset_row(&mut self) {
        self.metadata.clear();
        self.request = None;
        self.response = None;
        self.row_index += 1;
    }
}

impl OutputSink for JsonSplitOutput {
    fn open_output(&mut self, base: &Path) -> Result<()> {
        self.base = Some(base.to_path_buf());
        self.row_index = 0;
        Ok(())
    }

    fn begin_header(&mut self) -> Result<()> {
        Ok(())
    }

    fn header_column(&mut self, _column: Column) -> Result<()> {
        Ok(())
    }

    fn end_header(&mut self) -> Result<()> {
        Ok(())
    }

    fn begin_row(&mut self) -> Result<()> {
        self.metadata.clear();
        self.request = None;
        self.response = None;
        Ok(())
    }

    fn row_column(&mut self, column: Column, value: FieldValue<'_>) -> Result<()> {
        match (column, value) {
            (Column::Request, FieldValue::Blob(blob)) => self.request = blob.cloned(),
            (Column::Response, FieldValue::Blob(blob)) => self.response = blob.cloned(),
            (column, FieldValue::Text(text)) => {
                self.metadata.insert(column.name(), text.to_string());
            }
            (column, FieldValue::Blob(_)) => {
                debug!("Ignoring blob value for non-blob column {column}");
            }
        }
        Ok(())
    }

    fn end_row(&mut self) -> Result<RowOutcome> {
        let base = self.base.clone().ok_or(ConvertError::NotOpened("json"))?;

        let parsed = Self::parse_blob(self.request.as_ref()).and_then(|request| {
            Self::parse_blob(self.response.as_ref()).map(|response| (request, response))
        });

        let (request, response) = match parsed {
            Ok(messages) => messages,
            Err(e @ ConvertError::HttpParse(_)) if self.policy == MalformedRecordPolicy::Skip => {
                warn!("Skipping record {}: {e}", self.row_index);
                self.reset_row();
                return Ok(RowOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let stem = self.stem(&base);
        let metadata = std::mem::take(&mut self.metadata);

        self.write_document(with_suffix(&stem, METADATA_SUFFIX), &metadata)?;
        self.write_document(with_suffix(&stem, REQUEST_SUFFIX), &request)?;
        self.write_document(with_suffix(&stem, RESPONSE_SUFFIX), &response)?;

        self.reset_row();
        Ok(RowOutcome::Written)
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_row(
        output: &mut JsonSplitOutput, time: &str, request: Option<&Blob>, response: Option<&Blob>,
    ) -> Result<RowOutcome> {
        output.begin_row()?;
        for column in Column::ALL {
            let value = match column {
                Column::Time => FieldValue::Text(time),
                Column::Request => FieldValue::Blob(request),
                Column::Response => FieldValue::Blob(response),
                _ => FieldValue::Text(""),
            };
            output.row_column(column, value)?;
        }
        output.end_row()
    }

    #[test]
    fn test_sanitize_timestamp() {
        assert_eq!(JsonSplitOutput::sanitize_timestamp("12:00:00"), "120000");
        assert_eq!(
            JsonSplitOutput::sanitize_timestamp("Tue Mar 10 12:00:00 CET 2020"),
            "Tue_Mar_10_120000_CET_2020"
        );
        assert_eq!(JsonSplitOutput::sanitize_timestamp("10/03/2020"), "10-03-2020");
    }

    #[test]
    fn test_writes_three_files_per_row() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("basename");
        let mut output = JsonSplitOutput::new(MalformedRecordPolicy::Abort);
        output.open_output(&base).unwrap();

        let request = Blob::plain("GET /a HTTP/1.1\r\nHost: x\r\n\r\n");
        write_row(&mut output, "12:00:00", Some(&request), None).unwrap();
        write_row(&mut output, "12:00:00", Some(&request), None).unwrap();
        output.finish().unwrap();

        assert_eq!(output.row_index(), 2);
        assert_eq!(output.artifacts().len(), 6);
        assert!(temp_dir.path().join("basename_120000_0.json").exists());
        assert!(temp_dir.path().join("basename_120000_1.req.json").exists());
        assert!(temp_dir.path().join("basename_120000_1.res.json").exists());

        let request_doc =
            fs::read_to_string(temp_dir.path().join("basename_120000_0.req.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&request_doc).unwrap();
        assert_eq!(value["headers"]["Host"], "x");
        assert_eq!(value["method"], "GET");
    }

    #[test]
    fn test_metadata_excludes_blobs_and_sorts_keys() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("basename");
        let mut output = JsonSplitOutput::new(MalformedRecordPolicy::Abort);
        output.open_output(&base).unwrap();

        write_row(&mut output, "12:00:00", None, None).unwrap();

        let metadata = fs::read_to_string(temp_dir.path().join("basename_120000_0.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&metadata).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();

        assert_eq!(keys.len(), 13);
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(!keys.iter().any(|key| *key == "Request" || *key == "Response"));

        let response = fs::read_to_string(temp_dir.path().join("basename_120000_0.res.json")).unwrap();
        assert_eq!(response, "{}");
    }

    #[test]
    fn test_malformed_record_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let mut output = JsonSplitOutput::new(MalformedRecordPolicy::Abort);
        output.open_output(&temp_dir.path().join("basename")).unwrap();

        let broken = Blob::plain("GARBAGE");
        let result = write_row(&mut output, "12:00:00", Some(&broken), None);
        assert!(matches!(result, Err(ConvertError::HttpParse(_))));
    }

    #[test]
    fn test_malformed_record_skipped_advances_index() {
        let temp_dir = TempDir::new().unwrap();
        let mut output = JsonSplitOutput::new(MalformedRecordPolicy::Skip);
        output.open_output(&temp_dir.path().join("basename")).unwrap();

        let broken = Blob::plain("GARBAGE");
        let good = Blob::plain("GET / HTTP/1.1\r\n\r\n");
        assert_eq!(
            write_row(&mut output, "12:00:00", Some(&broken), None).unwrap(),
            RowOutcome::Skipped
        );
        assert_eq!(
            write_row(&mut output, "12:00:00", Some(&good), None).unwrap(),
            RowOutcome::Written
        );

        assert_eq!(output.artifacts().len(), 3);
        assert!(!temp_dir.path().join("basename_120000_0.json").exists());
        assert!(temp_dir.path().join("basename_120000_1.json").exists());
    }
}
