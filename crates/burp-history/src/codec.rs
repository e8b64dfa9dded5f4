use base64::alphabet;
use base64::engine::general_purpose::{
    GeneralPurpose,
    GeneralPurposeConfig,
    STANDARD,
};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use tracing::warn;

/// Largest cell a spreadsheet will accept without complaining.
pub const SPREADSHEET_CELL_LIMIT: usize = 32_760;

/// Characters kept from an oversized cell; the marker fills the rest.
pub const SPREADSHEET_TRUNCATED_LEN: usize = 32_744;

pub const TRUNCATION_MARKER: &str = "..[TRUNCATED!]";

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes a base64 blob to text. Never fails: invalid base64 is retried
/// with a lenient engine and finally returned untouched, invalid UTF-8 is
/// backslash-escaped byte by byte.
pub fn decode_base64(encoded: &str) -> String {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = match STANDARD.decode(&compact) {
        Ok(bytes) => bytes,
        Err(strict_err) => match LENIENT.decode(&compact) {
            Ok(bytes) => {
                warn!("Recovered malformed base64 blob ({strict_err}) with lenient decoding");
                bytes
            }
            Err(e) => {
                warn!("Undecodable base64 blob of {} chars: {e}", encoded.len());
                return encoded.to_string();
            }
        },
    };

    bytes_to_text(&bytes)
}

pub fn bytes_to_text(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    let mut text = String::with_capacity(bytes.len() + 16);
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        for byte in chunk.invalid() {
            text.push_str(&format!("\\x{byte:02x}"));
        }
    }
    text
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn truncate_for_spreadsheet(text: &str) -> String {
    match text.char_indices().nth(SPREADSHEET_CELL_LIMIT) {
        Some(_) => {
            let cut = text
                .char_indices()
                .nth(SPREADSHEET_TRUNCATED_LEN)
                .map(|(idx, _)| idx)
                .unwrap_or(text.len());
            format!("{}{}", &text[..cut], TRUNCATION_MARKER)
        }
        None => text.to_string(),
    }
}
