//! Embedded attachment resolution.
//!
//! Pipeline: raw HTML body → [`body::DocumentFragment`] (built once per
//! body) → [`matcher::NodeMatcher`] queries per attachment identifier →
//! [`classify`] decisions. [`generate`] mints identifiers for newly inserted
//! inline images.

pub mod body;
pub mod classify;
pub mod generate;
pub mod matcher;

pub use ego_tree::NodeId;

pub use body::{materialize_body, DocumentFragment, FragmentBuilder, HtmlFragmentBuilder};
pub use classify::{
    extract_embedded, is_embedded, Classification, EmbeddableTypes, EmbeddingResolver, MimePolicy,
};
pub use generate::{generate_cid, CidGenerator, CidHasher, HasherKind};
pub use matcher::{find_embedded, referenced_cids, src_to_cid, MatchSet, NodeMatcher};
