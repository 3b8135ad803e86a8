//! Message loading: HTML body and per-part attachment records.

use std::path::Path;

use mail_parser::{MessageParser, MimeHeaders, PartType};

use crate::error::{EmbedError, Result};
use crate::model::attachment::AttachmentMetadata;
use crate::parser::header::parse_header_block;

/// The pieces of a message the resolver works on.
#[derive(Debug, Clone, Default)]
pub struct LoadedMessage {
    /// First `text/html` body, if the message has one.
    pub html: Option<String>,
    /// One record per attachment part, inline images included.
    pub attachments: Vec<AttachmentMetadata>,
}

/// Read and parse an `.eml` file.
pub fn load_message_file(path: &Path) -> Result<LoadedMessage> {
    if !path.exists() {
        return Err(EmbedError::FileNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read(path).map_err(|e| EmbedError::io(path, e))?;
    load_message(&raw)
}

/// Parse a complete raw message (headers + body).
///
/// Part headers are re-read from the raw bytes so quoting and brackets
/// reach the normalizer exactly as the sender wrote them.
pub fn load_message(raw_message: &[u8]) -> Result<LoadedMessage> {
    let message_bytes = skip_from_line(raw_message);

    let msg = MessageParser::default()
        .parse(message_bytes)
        .ok_or_else(|| EmbedError::MimeError("Input is not a parseable message".into()))?;

    // Only a real text/html part counts; plain text is not converted.
    let html = msg.html_part(0).and_then(|part| match &part.body {
        PartType::Html(html) => Some(html.to_string()),
        _ => None,
    });
    let raw = msg.raw_message();

    let mut attachments = Vec::new();
    for part in msg.attachments() {
        let start = part.raw_header_offset();
        let end = part.raw_body_offset().min(raw.len());
        let headers = if start < end {
            parse_header_block(&raw[start..end])
        } else {
            Default::default()
        };

        let mime_type = part
            .content_type()
            .map(|ct| match ct.subtype() {
                Some(sub) => format!("{}/{}", ct.ctype(), sub),
                None => ct.ctype().to_string(),
            })
            .unwrap_or_else(|| "application/octet-stream".to_string())
            .to_lowercase();

        attachments.push(AttachmentMetadata {
            headers,
            mime_type,
            size: part.contents().len() as u64,
            decoded_name: part.attachment_name().map(str::to_string),
        });
    }

    tracing::debug!(
        attachments = attachments.len(),
        has_html = html.is_some(),
        "Loaded message"
    );

    Ok(LoadedMessage { html, attachments })
}

/// Skip an MBOX `From ` separator line (and a UTF-8 BOM) at the start.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELATED: &str = "From: a@example.com\r\n\
To: b@example.com\r\n\
Subject: inline\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/related; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Hi <img src=\"cid:logo@example.com\"></p>\r\n\
--b1\r\n\
Content-Type: image/png\r\n\
Content-ID: <logo@example.com>\r\n\
Content-Disposition: inline\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
iVBORw0KGgo=\r\n\
--b1--\r\n";

    #[test]
    fn test_load_message_related() {
        let loaded = load_message(RELATED.as_bytes()).unwrap();
        let html = loaded.html.expect("html body");
        assert!(html.contains("cid:logo@example.com"));
        assert_eq!(loaded.attachments.len(), 1);
        let att = &loaded.attachments[0];
        assert_eq!(att.mime_type, "image/png");
        assert_eq!(att.headers.content_id.as_deref(), Some("<logo@example.com>"));
        assert_eq!(att.cid(), "logo@example.com");
        assert_eq!(att.name(), "");
        assert_eq!(att.size, 8);
        assert_eq!(att.decoded_name, None);
    }

    #[test]
    fn test_headers_are_not_synthesized() {
        let raw = "From: a@example.com\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/related; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<img src=\"cid:logo@example.com\">\r\n\
--b1\r\n\
Content-Type: image/png; name=\"logo.png\"\r\n\
Content-ID: <logo@example.com>\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
iVBORw0KGgo=\r\n\
--b1--\r\n";
        let loaded = load_message(raw.as_bytes()).unwrap();
        assert_eq!(loaded.attachments.len(), 1);
        let att = &loaded.attachments[0];
        assert_eq!(att.headers.content_disposition, None);
        assert_eq!(att.name(), "");
        assert_eq!(att.decoded_name.as_deref(), Some("logo.png"));
        assert_eq!(att.display_name(), "logo.png");
        assert_eq!(att.headers.get("content-type"), Some("image/png; name=\"logo.png\""));
    }

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_from_line(data).starts_with(b"Subject:"));
        let plain = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_from_line(plain), plain);
    }

    #[test]
    fn test_load_message_file_missing() {
        let err = load_message_file(Path::new("/definitely/not/here.eml")).unwrap_err();
        assert!(matches!(err, EmbedError::FileNotFound(_)));
    }
}
