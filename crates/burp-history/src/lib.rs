pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod models;
pub mod output;
pub mod parser;
pub mod source;


pub use config::{
    ConvertConfig,
    CsvDelimiter,
    MalformedRecordPolicy,
    OutputFormat,
};
pub use converter::{
    ConversionSummary,
    Converter,
};
pub use error::ConvertError;
pub use models::{
    Column,
    TrafficRecord,
};
pub use parser::{
    HttpMessageParser,
    ParsedHttpMessage,
};
pub use source::{
    HistoryDocument,
    RecordStream,
};
