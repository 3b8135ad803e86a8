//! Core data model types for attachment headers and attachment records.

pub mod attachment;
pub mod headers;
