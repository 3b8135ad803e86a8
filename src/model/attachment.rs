//! Attachment metadata.
//!
//! The binary payload is never held here; this crate only needs the headers
//! and the MIME type to decide how an attachment is rendered.

use super::headers::AttachmentHeaders;
use crate::parser::header::{attachment_name, read_cid};

/// One attachment record as handed over by the message store.
///
/// Read-only from the resolver's point of view.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttachmentMetadata {
    /// Normalized MIME headers of the part.
    pub headers: AttachmentHeaders,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub mime_type: String,

    /// Decoded size in bytes, when known.
    #[serde(default)]
    pub size: u64,

    /// Filename decoded by the MIME parser (RFC 2047 / 2231, or the
    /// `Content-Type` `name` parameter). Display only; never fed back
    /// into `headers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoded_name: Option<String>,
}

impl AttachmentMetadata {
    pub fn new(headers: AttachmentHeaders, mime_type: impl Into<String>) -> Self {
        Self {
            headers,
            mime_type: mime_type.into(),
            size: 0,
            decoded_name: None,
        }
    }

    /// Content identifier with enclosing quotes or brackets removed.
    pub fn cid(&self) -> &str {
        read_cid(&self.headers)
    }

    /// Download name from `Content-Disposition`, empty for inline parts.
    pub fn name(&self) -> String {
        attachment_name(&self.headers)
    }

    /// Name to show a user: the disposition name, else the decoded name.
    pub fn display_name(&self) -> String {
        let name = self.name();
        if name.is_empty() {
            self.decoded_name.clone().unwrap_or_default()
        } else {
            name
        }
    }
}
