//! Locating the body elements that reference a content identifier.
//!
//! Bodies written by different client versions, or migrated from other
//! providers, store the reference under different attributes and with or
//! without the `cid:` scheme. The accepted combinations live in one table of
//! [`Convention`]s, checked in a single pass over the fragment's `img`
//! elements.

use scraper::ElementRef;

use super::body::DocumentFragment;

/// URL scheme prefix of a Content-ID reference.
pub const CID_SCHEME: &str = "cid:";

/// Default provider-specific attribute for pending inline images.
pub const DEFAULT_VENDOR_ATTRIBUTE: &str = "proton-src";

/// Attribute carrying the embedded image reference in current bodies.
pub const EMBEDDED_IMG_ATTRIBUTE: &str = "data-embedded-img";

/// Elements of one fragment that reference an identifier, in document order.
pub type MatchSet<'a> = Vec<ElementRef<'a>>;

/// How the identifier appears inside the attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueForm {
    /// The identifier itself: `abc@x.com`.
    Bare,
    /// The identifier behind the scheme: `cid:abc@x.com`.
    CidUrl,
}

impl ValueForm {
    fn matches(self, value: &str, cid: &str) -> bool {
        match self {
            ValueForm::Bare => value == cid,
            ValueForm::CidUrl => value.strip_prefix(CID_SCHEME) == Some(cid),
        }
    }
}

/// One accepted `(attribute, value form)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    pub attribute: String,
    pub form: ValueForm,
}

impl Convention {
    pub fn new(attribute: impl Into<String>, form: ValueForm) -> Self {
        Self {
            attribute: attribute.into().to_ascii_lowercase(),
            form,
        }
    }

    fn matches(&self, element: &ElementRef<'_>, cid: &str) -> bool {
        element
            .value()
            .attr(&self.attribute)
            .is_some_and(|value| self.form.matches(value, cid))
    }
}

/// Finds `img` elements referencing an identifier under any known convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatcher {
    conventions: Vec<Convention>,
}

impl NodeMatcher {
    /// The standard table, with `vendor_attribute` as the provider-specific slot:
    ///
    /// | attribute           | value            |
    /// |---------------------|------------------|
    /// | `src`               | `cid`, `cid:cid` |
    /// | `data-embedded-img` | `cid`, `cid:cid` |
    /// | `data-src`          | `cid:cid`        |
    /// | vendor attribute    | `cid:cid`        |
    pub fn new(vendor_attribute: &str) -> Self {
        use ValueForm::{Bare, CidUrl};
        Self::with_conventions(vec![
            Convention::new("src", Bare),
            Convention::new("src", CidUrl),
            Convention::new(EMBEDDED_IMG_ATTRIBUTE, Bare),
            Convention::new(EMBEDDED_IMG_ATTRIBUTE, CidUrl),
            Convention::new("data-src", CidUrl),
            Convention::new(vendor_attribute, CidUrl),
        ])
    }

    /// Use a custom convention table.
    pub fn with_conventions(conventions: Vec<Convention>) -> Self {
        Self { conventions }
    }

    pub fn conventions(&self) -> &[Convention] {
        &self.conventions
    }

    /// `true` if `element` is an `img` referencing `cid` under any convention.
    ///
    /// An empty identifier never matches, not even an empty attribute.
    pub fn references(&self, element: &ElementRef<'_>, cid: &str) -> bool {
        if cid.is_empty() || element.value().name() != "img" {
            return false;
        }
        self.conventions.iter().any(|c| {
            let hit = c.matches(element, cid);
            if hit {
                tracing::trace!(cid, attribute = %c.attribute, form = ?c.form, "Reference matched");
            }
            hit
        })
    }

    /// Every element of `fragment` referencing `cid`, in document order.
    pub fn find_embedded<'a>(&self, cid: &str, fragment: &'a DocumentFragment) -> MatchSet<'a> {
        if cid.is_empty() {
            return Vec::new();
        }
        fragment
            .elements()
            .filter(|element| self.references(element, cid))
            .collect()
    }

    /// Every identifier the fragment's `img` elements reference, in document
    /// order, without empties or repeats.
    ///
    /// A value counts when it carries the `cid:` scheme in any convention
    /// attribute, or is a bare `data-embedded-img` value. Bare `src` values
    /// are ordinary URLs and are skipped.
    pub fn referenced_cids(&self, fragment: &DocumentFragment) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for element in fragment.elements().filter(|e| e.value().name() == "img") {
            for convention in &self.conventions {
                let Some(value) = element.value().attr(&convention.attribute) else {
                    continue;
                };
                let cid = match value.strip_prefix(CID_SCHEME) {
                    Some(cid) => cid,
                    None if convention.attribute == EMBEDDED_IMG_ATTRIBUTE => value,
                    None => continue,
                };
                if !cid.is_empty() && !seen.iter().any(|s| s == cid) {
                    seen.push(cid.to_string());
                }
            }
        }
        seen
    }

    /// `true` if at least one element of `fragment` references `cid`.
    pub fn is_referenced(&self, cid: &str, fragment: &DocumentFragment) -> bool {
        !cid.is_empty() && fragment.elements().any(|e| self.references(&e, cid))
    }
}

impl Default for NodeMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_VENDOR_ATTRIBUTE)
    }
}

/// [`NodeMatcher::find_embedded`] with the default convention table.
pub fn find_embedded<'a>(cid: &str, fragment: &'a DocumentFragment) -> MatchSet<'a> {
    NodeMatcher::default().find_embedded(cid, fragment)
}

/// Identifier stored in an element's `data-embedded-img` attribute.
///
/// One leading `cid:` is stripped; occurrences elsewhere in the value are kept.
/// Missing attribute gives `""`.
pub fn src_to_cid<'a>(element: &ElementRef<'a>) -> &'a str {
    let value = element.value().attr(EMBEDDED_IMG_ATTRIBUTE).unwrap_or("");
    value.strip_prefix(CID_SCHEME).unwrap_or(value)
}

/// Identifiers referenced anywhere in the fragment under the default table.
pub fn referenced_cids(fragment: &DocumentFragment) -> Vec<String> {
    NodeMatcher::default().referenced_cids(fragment)
}
