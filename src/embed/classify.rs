//! Embedded vs. regular attachment decisions.

use std::collections::HashSet;

use ego_tree::NodeId;
use tracing::debug;

use super::body::{materialize_body, DocumentFragment, FragmentBuilder, HtmlFragmentBuilder};
use super::matcher::{find_embedded, MatchSet, NodeMatcher};
use crate::config::Config;
use crate::model::attachment::AttachmentMetadata;
use crate::parser::header::read_cid;

/// Decides which MIME types may be rendered inline.
pub trait MimePolicy {
    fn is_embeddable(&self, mime_type: &str) -> bool;
}

impl<F> MimePolicy for F
where
    F: Fn(&str) -> bool,
{
    fn is_embeddable(&self, mime_type: &str) -> bool {
        self(mime_type)
    }
}

/// A fixed set of inlineable MIME types.
///
/// Comparison ignores case and any `;` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddableTypes {
    types: HashSet<String>,
}

impl EmbeddableTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types.into_iter().map(|t| essence(t.as_ref())).collect(),
        }
    }
}

impl Default for EmbeddableTypes {
    fn default() -> Self {
        Self::new(crate::config::PolicyConfig::default().embeddable_types)
    }
}

impl MimePolicy for EmbeddableTypes {
    fn is_embeddable(&self, mime_type: &str) -> bool {
        self.types.contains(&essence(mime_type))
    }
}

/// `"Image/PNG; name=a.png"` → `"image/png"`.
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// How an attachment relates to a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Referenced from the body and of an inlineable type.
    Embedded,
    /// Referenced from the body, but the type cannot be shown inline.
    Referenced,
    /// Not referenced from the body.
    Regular,
}

impl Classification {
    /// Whether the attachment belongs in the generic attachment list.
    ///
    /// Anything the body references is hidden from it.
    pub fn listed(self) -> bool {
        self == Classification::Regular
    }
}

/// Fragment building, reference matching and MIME policy bundled together.
#[derive(Debug, Clone)]
pub struct EmbeddingResolver<B = HtmlFragmentBuilder, P = EmbeddableTypes> {
    builder: B,
    policy: P,
    matcher: NodeMatcher,
}

impl EmbeddingResolver {
    /// Resolver with the configured vendor attribute and MIME table.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            HtmlFragmentBuilder,
            EmbeddableTypes::new(&config.policy.embeddable_types),
            NodeMatcher::new(&config.matching.vendor_attribute),
        )
    }
}

impl Default for EmbeddingResolver {
    fn default() -> Self {
        Self::new(HtmlFragmentBuilder, EmbeddableTypes::default(), NodeMatcher::default())
    }
}

impl<B: FragmentBuilder, P: MimePolicy> EmbeddingResolver<B, P> {
    pub fn new(builder: B, policy: P, matcher: NodeMatcher) -> Self {
        Self {
            builder,
            policy,
            matcher,
        }
    }

    pub fn matcher(&self) -> &NodeMatcher {
        &self.matcher
    }

    /// Parse a body once; reuse the result for every attachment of the message.
    pub fn materialize(&self, body: &str) -> DocumentFragment {
        self.builder.parse_fragment(body)
    }

    /// Elements of `fragment` referencing the attachment's identifier.
    pub fn find_embedded<'a>(
        &self,
        attachment: &AttachmentMetadata,
        fragment: &'a DocumentFragment,
    ) -> MatchSet<'a> {
        self.matcher.find_embedded(read_cid(&attachment.headers), fragment)
    }

    /// Point every element referencing the attachment at `url` by rewriting
    /// its `src`. Returns how many elements were rewritten.
    pub fn resolve_src(
        &self,
        attachment: &AttachmentMetadata,
        fragment: &mut DocumentFragment,
        url: &str,
    ) -> usize {
        let nodes: Vec<NodeId> = self
            .find_embedded(attachment, fragment)
            .iter()
            .map(|element| element.id())
            .collect();
        let rewritten = nodes
            .into_iter()
            .filter(|&node| fragment.set_attribute(node, "src", url))
            .count();
        debug!(cid = attachment.cid(), rewritten, "Resolved inline sources");
        rewritten
    }

    /// Referenced from `body` AND of an inlineable MIME type.
    pub fn is_embedded(&self, attachment: &AttachmentMetadata, body: &str) -> bool {
        let fragment = self.materialize(body);
        self.classify(attachment, &fragment) == Classification::Embedded
    }

    /// Attachments whose identifier appears anywhere in `fragment`.
    ///
    /// The MIME type is not consulted: a referenced attachment is hidden
    /// from the file list whatever its type.
    pub fn extract_embedded<'a>(
        &self,
        attachments: &'a [AttachmentMetadata],
        fragment: &DocumentFragment,
    ) -> Vec<&'a AttachmentMetadata> {
        attachments
            .iter()
            .filter(|att| self.matcher.is_referenced(read_cid(&att.headers), fragment))
            .collect()
    }

    /// Three-way classification against an already built fragment.
    pub fn classify(
        &self,
        attachment: &AttachmentMetadata,
        fragment: &DocumentFragment,
    ) -> Classification {
        let cid = read_cid(&attachment.headers);
        let class = if !self.matcher.is_referenced(cid, fragment) {
            Classification::Regular
        } else if self.policy.is_embeddable(&attachment.mime_type) {
            Classification::Embedded
        } else {
            Classification::Referenced
        };
        debug!(cid, mime_type = %attachment.mime_type, ?class, "Classified attachment");
        class
    }

    /// Classify every attachment of a message, parsing `body` once.
    pub fn classify_all<'a>(
        &self,
        attachments: &'a [AttachmentMetadata],
        body: &str,
    ) -> Vec<(&'a AttachmentMetadata, Classification)> {
        let fragment = self.materialize(body);
        attachments
            .iter()
            .map(|att| (att, self.classify(att, &fragment)))
            .collect()
    }
}

/// Referenced from `body` AND accepted by `policy`.
pub fn is_embedded(attachment: &AttachmentMetadata, body: &str, policy: &impl MimePolicy) -> bool {
    let fragment = materialize_body(Some(body));
    let nodes = find_embedded(read_cid(&attachment.headers), &fragment);
    !nodes.is_empty() && policy.is_embeddable(&attachment.mime_type)
}

/// Attachments whose identifier appears anywhere in `fragment`, MIME type ignored.
pub fn extract_embedded<'a>(
    attachments: &'a [AttachmentMetadata],
    fragment: &DocumentFragment,
) -> Vec<&'a AttachmentMetadata> {
    EmbeddingResolver::default().extract_embedded(attachments, fragment)
}
