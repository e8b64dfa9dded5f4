use std::fmt;

/// Text rendered in place of a request or response the capture does not have.
pub const MISSING_BLOB: &str = "None";

/// The fixed column projection shared by every output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Time,
    Url,
    Hostname,
    IpAddress,
    Port,
    Protocol,
    Method,
    Path,
    Extension,
    Request,
    Status,
    ResponseLength,
    MimeType,
    Response,
    Comment,
}

impl Column {
    pub const ALL: [Column; 15] = [
        Column::Time,
        Column::Url,
        Column::Hostname,
        Column::IpAddress,
        Column::Port,
        Column::Protocol,
        Column::Method,
        Column::Path,
        Column::Extension,
        Column::Request,
        Column::Status,
        Column::ResponseLength,
        Column::MimeType,
        Column::Response,
        Column::Comment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Time => "Time",
            Column::Url => "URL",
            Column::Hostname => "Hostname",
            Column::IpAddress => "IP address",
            Column::Port => "Port",
            Column::Protocol => "Protocol",
            Column::Method => "Method",
            Column::Path => "Path",
            Column::Extension => "Extension",
            Column::Request => "Request",
            Column::Status => "Status",
            Column::ResponseLength => "Response length",
            Column::MimeType => "MIME type",
            Column::Response => "Response",
            Column::Comment => "Comment",
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Column::Request | Column::Response)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw request or response as found in the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: String,
    pub base64: bool,
}

impl Blob {
    pub fn encoded(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            base64: true,
        }
    }

    pub fn plain(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            base64: false,
        }
    }

    pub fn decode(&self) -> String {
        if self.base64 {
            crate::codec::decode_base64(&self.data)
        } else {
            self.data.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Blob(Option<&'a Blob>),
}

impl FieldValue<'_> {
    pub fn is_blob(&self) -> bool {
        matches!(self, FieldValue::Blob(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficRecord {
    pub time: String,
    pub url: String,
    pub hostname: String,
    pub ip_address: String,
    pub port: String,
    pub protocol: String,
    pub method: String,
    pub path: String,
    pub extension: String,
    pub request: Option<Blob>,
    pub status: String,
    pub response_length: String,
    pub mime_type: String,
    pub response: Option<Blob>,
    pub comment: String,
}

impl TrafficRecord {
    pub fn value(&self, column: Column) -> FieldValue<'_> {
        match column {
            Column::Time => FieldValue::Text(&self.time),
            Column::Url => FieldValue::Text(&self.url),
            Column::Hostname => FieldValue::Text(&self.hostname),
            Column::IpAddress => FieldValue::Text(&self.ip_address),
            Column::Port => FieldValue::Text(&self.port),
            Column::Protocol => FieldValue::Text(&self.protocol),
            Column::Method => FieldValue::Text(&self.method),
            Column::Path => FieldValue::Text(&self.path),
            Column::Extension => FieldValue::Text(&self.extension),
            Column::Request => FieldValue::Blob(self.request.as_ref()),
            Column::Status => FieldValue::Text(&self.status),
            Column::ResponseLength => FieldValue::Text(&self.response_length),
            Column::MimeType => FieldValue::Text(&self.mime_type),
            Column::Response => FieldValue::Blob(self.response.as_ref()),
            Column::Comment => FieldValue::Text(&self.comment),
        }
    }

    /// All fields in column order.
    pub fn fields(&self) -> impl Iterator<Item = (Column, FieldValue<'_>)> + '_ {
        Column::ALL
            .iter()
            .map(move |&column| (column, self.value(column)))
    }
}
