//! Typed view over the loosely structured header map of an attachment.
//!
//! Message stores hand headers over as a name → value map whose keys and
//! value types vary between providers. Everything is normalized here, at the
//! boundary, so the rest of the crate only sees lower-cased names and string
//! values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Headers of one attachment part.
///
/// The three headers the resolver reads get their own field; anything else
/// is kept in `other` under its lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentHeaders {
    /// Raw `Content-ID` value, quotes and brackets included.
    pub content_id: Option<String>,
    /// Raw `Content-Location` value.
    pub content_location: Option<String>,
    /// Raw `Content-Disposition` value.
    pub content_disposition: Option<String>,
    /// Every other header, keyed by lower-cased name.
    pub other: BTreeMap<String, String>,
}

impl AttachmentHeaders {
    /// Build from `(name, value)` pairs. Names are matched case-insensitively;
    /// the first occurrence of a name wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::default();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value);
        }
        headers
    }

    /// Build from a JSON object as returned by a message API.
    ///
    /// Numbers and booleans are coerced to their string form, so a numeric
    /// Content-ID still yields an identifier. `null`, arrays and nested
    /// objects are skipped. A non-object value yields empty headers.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut headers = Self::default();
        let Some(map) = value.as_object() else {
            return headers;
        };
        for (name, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => {
                    tracing::trace!(header = %name, "Skipping non-scalar header value");
                    continue;
                }
            };
            headers.insert(name, text);
        }
        headers
    }

    /// Record one header unless a value for that name is already present.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.trim().to_ascii_lowercase();
        let slot = match name.as_str() {
            "content-id" => &mut self.content_id,
            "content-location" => &mut self.content_location,
            "content-disposition" => &mut self.content_disposition,
            _ => {
                self.other.entry(name).or_insert_with(|| value.into());
                return;
            }
        };
        if slot.is_none() {
            *slot = Some(value.into());
        }
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "content-id" => self.content_id.as_deref(),
            "content-location" => self.content_location.as_deref(),
            "content-disposition" => self.content_disposition.as_deref(),
            other => self.other.get(other).map(String::as_str),
        }
    }

    /// `true` when no header at all was recorded.
    pub fn is_empty(&self) -> bool {
        self.content_id.is_none()
            && self.content_location.is_none()
            && self.content_disposition.is_none()
            && self.other.is_empty()
    }
}
