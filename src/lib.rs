//! `mailembed` — tells embedded (inline, `cid:`-referenced) email
//! attachments apart from regular ones.
//!
//! This crate provides header normalization for content identifiers,
//! reference matching against parsed HTML bodies, embedding classification,
//! content identifier generation, and a small blob fetch adapter.

pub mod config;
pub mod embed;
pub mod error;
pub mod fetch;
pub mod model;
pub mod parser;
