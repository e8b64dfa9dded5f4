use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::debug;

use crate::error::{
    ConvertError,
    Result,
};
use crate::models::{
    Blob,
    TrafficRecord,
};

const ROOT_ELEMENT: &str = "items";

#[derive(Debug, Deserialize)]
struct RawHistory {
    #[serde(rename = "item", default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawItem {
    time: String,
    url: String,
    host: RawHost,
    port: String,
    protocol: String,
    method: String,
    path: String,
    extension: String,
    request: Option<RawBlob>,
    status: String,
    responselength: String,
    mimetype: String,
    response: Option<RawBlob>,
    comment: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawHost {
    #[serde(rename = "$text", default)]
    name: String,
    #[serde(rename = "@ip", default)]
    ip: String,
}

#[derive(Debug, Deserialize)]
struct RawBlob {
    #[serde(rename = "@base64", default)]
    base64: Option<String>,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

impl RawBlob {
    fn into_blob(self) -> Option<Blob> {
        let data = self.text.filter(|text| !text.is_empty())?;
        let base64 = self
            .base64
            .map_or(true, |flag| !flag.trim().eq_ignore_ascii_case("false"));
        Some(Blob { data, base64 })
    }
}

impl From<RawItem> for TrafficRecord {
    fn from(item: RawItem) -> Self {
        TrafficRecord {
            time: item.time,
            url: item.url,
            hostname: item.host.name,
            ip_address: item.host.ip,
            port: item.port,
            protocol: item.protocol,
            method: item.method,
            path: item.path,
            extension: item.extension,
            request: item.request.and_then(RawBlob::into_blob),
            status: item.status,
            response_length: item.responselength,
            mime_type: item.mimetype,
            response: item.response.and_then(RawBlob::into_blob),
            comment: item.comment,
        }
    }
}

/// A Burp Suite proxy history export held fully in memory.
#[derive(Debug)]
pub struct HistoryDocument {
    items: Vec<RawItem>,
}

impl HistoryDocument {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        debug!("Read {} bytes of proxy history from {}", text.len(), path.display());
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root = root_element(text)?;
        if root != ROOT_ELEMENT {
            return Err(ConvertError::SourceFormat(format!(
                "expected <{ROOT_ELEMENT}> root element, found <{root}>"
            )));
        }

        let history: RawHistory = quick_xml::de::from_str(text)?;
        debug!("Parsed {} history items", history.items.len());

        Ok(Self {
            items: history.items,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_records(self) -> RecordStream {
        RecordStream {
            items: self.items.into_iter(),
        }
    }
}

fn root_element(text: &str) -> Result<String> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => {
                return Ok(String::from_utf8_lossy(tag.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => {
                return Err(ConvertError::SourceFormat(
                    "document has no root element".to_string(),
                ))
            }
            Ok(_) => continue,
            Err(e) => return Err(ConvertError::SourceFormat(e.to_string())),
        }
    }
}

/// Read-once stream of records in document order.
#[derive(Debug)]
pub struct RecordStream {
    items: std::vec::IntoIter<RawItem>,
}

impl Iterator for RecordStream {
    type Item = TrafficRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(TrafficRecord::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for RecordStream {}
