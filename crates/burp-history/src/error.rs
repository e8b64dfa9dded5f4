use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid proxy history document: {0}")]
    SourceFormat(String),

    #[error("Failed to parse HTTP message: {0}")]
    HttpParse(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output {0} used before it was opened")]
    NotOpened(&'static str),
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<quick_xml::DeError> for ConvertError {
    fn from(err: quick_xml::DeError) -> Self {
        ConvertError::SourceFormat(err.to_string())
    }
}

impl From<httparse::Error> for ConvertError {
    fn from(err: httparse::Error) -> Self {
        ConvertError::HttpParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
