use std::path::{
    Path,
    PathBuf,
};

use tracing::{
    debug,
    error,
    info,
};

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::models::{
    Column,
    TrafficRecord,
};
use crate::output::{
    OutputSink,
    OutputStrategy,
    RowOutcome,
};
use crate::source::HistoryDocument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Records read from the history, skipped ones included.
    pub records: usize,
    pub skipped: usize,
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn convert_file(&self, source: impl AsRef<Path>) -> Result<ConversionSummary> {
        let document = HistoryDocument::from_path(source)?;
        self.run(document.into_records())
    }

    /// Writes `records` in the configured format. On failure the output is
    /// flushed so everything before the failing record stays on disk.
    pub fn run<I>(&self, records: I) -> Result<ConversionSummary>
    where
        I: IntoIterator<Item = TrafficRecord>,
    {
        let mut sink = OutputStrategy::from_config(&self.config);
        self.run_with(&mut sink, records)
    }

    /// Same as [`Converter::run`] but writes through a caller-supplied sink.
    pub fn run_with<S, I>(&self, sink: &mut S, records: I) -> Result<ConversionSummary>
    where
        S: OutputSink + ?Sized,
        I: IntoIterator<Item = TrafficRecord>,
    {
        info!(
            "Converting proxy history to {} ({})",
            self.config.format(),
            self.config.output_base().display()
        );

        match Self::drive(&mut *sink, self.config.output_base(), records) {
            Ok(summary) => {
                info!(
                    "Converted {} records ({} skipped) into {} files",
                    summary.records,
                    summary.skipped,
                    summary.artifacts.len()
                );
                Ok(summary)
            }
            Err(e) => {
                if let Err(flush_err) = sink.flush() {
                    error!("Failed to flush partial output: {flush_err}");
                }
                Err(e)
            }
        }
    }

    /// Runs the header, rows, footer protocol against any sink.
    pub fn drive<S, I>(sink: &mut S, base: &Path, records: I) -> Result<ConversionSummary>
    where
        S: OutputSink + ?Sized,
        I: IntoIterator<Item = TrafficRecord>,
    {
        let mut summary = ConversionSummary::default();

        sink.open_output(base)?;

        sink.begin_header()?;
        for column in Column::ALL {
            sink.header_column(column)?;
        }
        sink.end_header()?;

        for record in records {
            debug!("Writing record {} ({})", summary.records, record.url);
            sink.begin_row()?;
            for (column, value) in record.fields() {
                sink.row_column(column, value)?;
            }
            if sink.end_row()? == RowOutcome::Skipped {
                summary.skipped += 1;
            }
            summary.records += 1;
        }

        sink.finish()?;
        summary.artifacts = sink.artifacts().to_vec();
        Ok(summary)
    }
}
