use std::collections::BTreeMap;

use httparse::{
    Status as ParseStatus,
    EMPTY_HEADER,
};
use serde::Serialize;

use crate::codec::bytes_to_text;
use crate::error::{
    ConvertError,
    Result,
};

const MAX_HEADERS: usize = 128;

const CRLF: &str = "\r\n";

/// A captured request or response split into start line, headers and body.
///
/// Both kinds of message are stored the same way: the first token of the
/// start line lands in `method`, the second in `url`. For a response that
/// means `method` holds the protocol version and `url` the status code.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedHttpMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Second start-line token. A response's reason phrase is dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ParsedHttpMessage {
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.url.is_none()
            && self.headers.is_empty()
            && self.body.is_none()
    }
}

pub struct HttpMessageParser;

impl HttpMessageParser {
    /// Parses one decoded message using CRLF line endings. Empty input gives
    /// an empty message.
    pub fn parse(message: &str) -> Result<ParsedHttpMessage> {
        if message.is_empty() {
            return Ok(ParsedHttpMessage::default());
        }

        let (start_line, rest) = message.split_once(CRLF).unwrap_or((message, ""));
        let (method, url) = Self::split_start_line(start_line)?;
        let (headers, body) = Self::split_headers(rest)?;

        Ok(ParsedHttpMessage {
            method: Some(method.to_string()),
            url: Some(url.to_string()),
            headers,
            body: Some(body.to_string()),
        })
    }

    fn split_start_line(start_line: &str) -> Result<(&str, &str)> {
        let (method, target) = start_line.split_once(' ').ok_or_else(|| {
            ConvertError::HttpParse(format!("no space in start line {start_line:?}"))
        })?;

        let url = target.split(' ').next().unwrap_or(target);
        Ok((method, url))
    }

    fn split_headers(block: &str) -> Result<(BTreeMap<String, String>, &str)> {
        let mut headers = BTreeMap::new();

        if block.is_empty() {
            return Ok((headers, ""));
        }
        if let Some(body) = block.strip_prefix(CRLF) {
            return Ok((headers, body));
        }

        let body = match Self::parse_header_block(block, &mut headers)? {
            Some(body_start) => &block[body_start..],
            None => {
                let terminated = if block.ends_with(CRLF) {
                    format!("{block}{CRLF}")
                } else {
                    format!("{block}{CRLF}{CRLF}")
                };
                if Self::parse_header_block(&terminated, &mut headers)?.is_none() {
                    return Err(ConvertError::HttpParse(
                        "unterminated header block".to_string(),
                    ));
                }
                ""
            }
        };

        Ok((headers, body))
    }

    /// Returns the body offset, or `None` when the block has no blank line.
    /// The header buffer grows until every header line fits.
    fn parse_header_block(
        block: &str, headers: &mut BTreeMap<String, String>,
    ) -> Result<Option<usize>> {
        let mut raw_headers: Vec<httparse::Header<'_>> = vec![EMPTY_HEADER; MAX_HEADERS];

        loop {
            let needed = match httparse::parse_headers(block.as_bytes(), &mut raw_headers) {
                Ok(ParseStatus::Complete((body_start, parsed))) => {
                    Self::collect_headers(parsed, headers);
                    return Ok(Some(body_start));
                }
                Ok(ParseStatus::Partial) => return Ok(None),
                Err(httparse::Error::TooManyHeaders) => block.matches(CRLF).count() + 1,
                Err(e) => return Err(e.into()),
            };
            let grown = needed.max(raw_headers.len() * 2);
            raw_headers = vec![EMPTY_HEADER; grown];
        }
    }

    fn collect_headers(parsed: &[httparse::Header<'_>], headers: &mut BTreeMap<String, String>) {
        for header in parsed {
            headers.insert(header.name.to_string(), bytes_to_text(header.value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let parsed = HttpMessageParser::parse("GET /a HTTP/1.1\r\nHost: x\r\n\r\nbody").unwrap();

        assert_eq!(parsed.method.as_deref(), Some("GET"));
        assert_eq!(parsed.url.as_deref(), Some("/a"));
        assert_eq!(parsed.headers.len(), 1);
        assert_eq!(parsed.headers.get("Host").map(String::as_str), Some("x"));
        assert_eq!(parsed.body.as_deref(), Some("body"));
    }

    #[test]
    fn test_parse_empty() {
        let parsed = HttpMessageParser::parse("").unwrap();
        assert!(parsed.is_empty());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "{}");
    }

    #[test]
    fn test_parse_response_start_line() {
        let parsed =
            HttpMessageParser::parse("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").unwrap();

        assert_eq!(parsed.method.as_deref(), Some("HTTP/1.1"));
        assert_eq!(parsed.url.as_deref(), Some("200"));
        assert_eq!(
            parsed.headers.get("Content-Length").map(String::as_str),
            Some("2")
        );
        assert_eq!(parsed.body.as_deref(), Some("ok"));
    }

    #[test]
    fn test_parse_without_headers() {
        let parsed = HttpMessageParser::parse("GET /a HTTP/1.1\r\n\r\n").unwrap();

        assert!(parsed.headers.is_empty());
        assert_eq!(parsed.body.as_deref(), Some(""));
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"{"method":"GET","url":"/a","body":""}"#
        );
    }

    #[test]
    fn test_parse_start_line_only() {
        let parsed = HttpMessageParser::parse("GET /only").unwrap();

        assert_eq!(parsed.url.as_deref(), Some("/only"));
        assert!(parsed.headers.is_empty());
        assert_eq!(parsed.body.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_unterminated_headers() {
        let parsed = HttpMessageParser::parse("GET / HTTP/1.1\r\nHost: x\r\nAccept: */*").unwrap();

        assert_eq!(parsed.headers.len(), 2);
        assert_eq!(parsed.headers.get("Accept").map(String::as_str), Some("*/*"));
        assert_eq!(parsed.body.as_deref(), Some(""));
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let parsed =
            HttpMessageParser::parse("GET / HTTP/1.1\r\nX-A: 1\r\nX-A: 2\r\n\r\n").unwrap();
        assert_eq!(parsed.headers.get("X-A").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_header_case_is_preserved() {
        let parsed =
            HttpMessageParser::parse("GET / HTTP/1.1\r\ncontent-TYPE: text/plain\r\n\r\n").unwrap();
        assert!(parsed.headers.contains_key("content-TYPE"));
    }

    #[test]
    fn test_body_keeps_blank_lines() {
        let parsed =
            HttpMessageParser::parse("POST / HTTP/1.1\r\nHost: x\r\n\r\na\r\n\r\nb").unwrap();
        assert_eq!(parsed.body.as_deref(), Some("a\r\n\r\nb"));
    }

    #[test]
    fn test_parse_more_headers_than_initial_buffer() {
        let mut message = String::from("GET / HTTP/1.1\r\n");
        for i in 0..MAX_HEADERS + 2 {
            message.push_str(&format!("X-H{i}: v\r\n"));
        }
        message.push_str("\r\nbody");

        let parsed = HttpMessageParser::parse(&message).unwrap();
        assert_eq!(parsed.headers.len(), MAX_HEADERS + 2);
        assert_eq!(parsed.headers.get("X-H129").map(String::as_str), Some("v"));
        assert_eq!(parsed.body.as_deref(), Some("body"));
    }

    #[test]
    fn test_unterminated_block_with_many_headers() {
        let mut message = String::from("GET / HTTP/1.1");
        for i in 0..MAX_HEADERS * 3 {
            message.push_str(&format!("\r\nX-H{i}: v"));
        }

        let parsed = HttpMessageParser::parse(&message).unwrap();
        assert_eq!(parsed.headers.len(), MAX_HEADERS * 3);
        assert_eq!(parsed.body.as_deref(), Some(""));
    }

    #[test]
    fn test_no_space_in_start_line_is_error() {
        let result = HttpMessageParser::parse("GARBAGE\r\n\r\n");
        assert!(matches!(result, Err(ConvertError::HttpParse(_))));
    }

    #[test]
    fn test_malformed_header_is_error() {
        let result = HttpMessageParser::parse("GET / HTTP/1.1\r\nnot a header\r\n\r\n");
        assert!(matches!(result, Err(ConvertError::HttpParse(_))));
    }
}
