//! Charset detection for fetched pages.
//!
//! Order: byte-order mark, Content-Type charset, `<meta charset>` within the
//! first [`SNIFF_LEN`] bytes, valid UTF-8 prefix, then windows-1252.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use lazy_static::lazy_static;
use regex::bytes::Regex;

use super::FetchedPage;

/// Bytes inspected when guessing the encoding
pub const SNIFF_LEN: usize = 1024;

lazy_static! {
    static ref META_CHARSET: Regex =
        Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#).unwrap();
}

pub fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];

    if let Some((encoding, _)) = Encoding::for_bom(head) {
        return encoding;
    }

    if let Some(encoding) = content_type.and_then(charset_from_content_type) {
        return encoding;
    }

    if let Some(encoding) = META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    match std::str::from_utf8(head) {
        Ok(_) => UTF_8,
        // The prefix may cut a multi-byte sequence in half
        Err(e) if e.error_len().is_none() => UTF_8,
        Err(_) => WINDOWS_1252,
    }
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| {
            let label = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Encoding::for_label(label.as_bytes())
        })
}

/// Decode a page body into UTF-8 text. Malformed sequences become U+FFFD.
pub fn decode_to_utf8(page: &FetchedPage) -> String {
    let encoding = detect_encoding(&page.bytes, page.content_type.as_deref());
    let (text, used, had_errors) = encoding.decode(&page.bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "Page contained malformed sequences");
    }
    text.into_owned()
}
