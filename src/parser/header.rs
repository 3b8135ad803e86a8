//! Content identifier extraction: unquoting, Content-ID / Content-Location
//! preference, download names, and raw header block unfolding.
//!
//! Every function here is total. Header data comes from many providers and
//! older message formats, so malformed input degrades to an empty or
//! unchanged value instead of an error.

use crate::model::headers::AttachmentHeaders;

/// Opening delimiters and the closer each one pairs with.
const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('\'', '\''), ('<', '>')];

/// Remove one layer of enclosing `"…"`, `'…'` or `<…>` after trimming.
///
/// Mismatched delimiters (`"abc>`) are left in place; only surrounding
/// whitespace is removed then. A lone `"` or `'` counts as both opener and
/// closer and yields `""`; a lone `<` stays.
///
/// ```
/// use mailembed::parser::header::trim_quotes;
/// assert_eq!(trim_quotes(" <abc@x.com> "), "abc@x.com");
/// assert_eq!(trim_quotes("\"abc>"), "\"abc>");
/// ```
pub fn trim_quotes(value: &str) -> &str {
    let value = value.trim();
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return value;
    };
    let last = chars.next_back().unwrap_or(first);

    let paired = QUOTE_PAIRS
        .iter()
        .any(|&(open, close)| first == open && last == close);
    if !paired {
        return value;
    }
    if value.len() == first.len_utf8() {
        return "";
    }
    &value[first.len_utf8()..value.len() - last.len_utf8()]
}

/// Read the content identifier of an attachment.
///
/// `Content-ID` wins; without one, `Content-Location` stands in (some
/// senders reference inline images by location only). Empty values count as
/// absent. Returns `""` when neither header is usable.
pub fn read_cid(headers: &AttachmentHeaders) -> &str {
    if let Some(id) = non_empty(&headers.content_id) {
        return trim_quotes(id);
    }
    if let Some(location) = non_empty(&headers.content_location) {
        return trim_quotes(location);
    }
    ""
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Best-effort download name from `Content-Disposition`.
///
/// Inline parts have no download name. Otherwise the text between the first
/// `filename=` and the next `filename=` (or the end of the value) is returned
/// with all double quotes removed. Trailing parameters are not cut off and
/// RFC 2231 continuations are not decoded.
pub fn attachment_name(headers: &AttachmentHeaders) -> String {
    let disposition = headers.content_disposition.as_deref().unwrap_or("");
    if disposition == "inline" {
        return String::new();
    }

    match disposition.split("filename=").nth(1) {
        Some(name) if !name.is_empty() => name.replace('"', ""),
        _ => String::new(),
    }
}

/// Parse a raw RFC 5322 header block (a MIME part's headers) into
/// [`AttachmentHeaders`].
///
/// Continuation lines are unfolded; lines without a colon are skipped.
pub fn parse_header_block(raw: &[u8]) -> AttachmentHeaders {
    let text = decode_header_bytes(raw);
    AttachmentHeaders::from_pairs(unfold_headers(&text))
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold headers: join continuation lines (starting with space or tab) with the previous header.
///
/// Stops at the first blank line. Returns `(lowercase_name, value)` pairs.
fn unfold_headers(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                if !last.1.is_empty() {
                    last.1.push(' ');
                }
                last.1.push_str(line.trim());
            }
        } else if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim().to_lowercase();
            let value = line[colon_pos + 1..].trim().to_string();
            result.push((name, value));
        }
    }

    result
}
