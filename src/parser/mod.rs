//! Header normalization and message loading.

pub mod header;
pub mod mime;
