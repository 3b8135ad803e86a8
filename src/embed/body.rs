//! HTML body → queryable fragment.

use ego_tree::NodeId;
use html5ever::{LocalName, Namespace, QualName};
use scraper::{ElementRef, Html, Node, StrTendril};

/// A parsed message body with fragment semantics: no implied document,
/// nothing executed, attributes kept verbatim.
///
/// Each call to a builder yields a fresh fragment, so bodies never leak
/// into each other and fragments can be built on any thread.
#[derive(Debug, Clone)]
pub struct DocumentFragment {
    html: Html,
}

impl DocumentFragment {
    /// Parse `content` as an HTML fragment.
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_fragment(content),
        }
    }

    /// Every element of the fragment, in document order.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    /// Serialized markup of the fragment's children.
    pub fn to_html(&self) -> String {
        self.html.root_element().inner_html()
    }

    /// The underlying parsed tree.
    pub fn as_html(&self) -> &Html {
        &self.html
    }

    /// Set attribute `name` on the element `node` (from [`ElementRef::id`]),
    /// replacing any previous value.
    ///
    /// Returns `false` when `node` is not an element of this fragment.
    /// `id` and `class` are refused: the parsed element caches them.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> bool {
        let name = name.to_ascii_lowercase();
        if name == "id" || name == "class" {
            return false;
        }
        let Some(mut node) = self.html.tree.get_mut(node) else {
            return false;
        };
        let Node::Element(element) = node.value() else {
            return false;
        };
        let key = QualName::new(None, Namespace::from(""), LocalName::from(name.as_str()));
        element.attrs.insert(key, StrTendril::from_slice(value));
        true
    }
}

/// Turns body text into a [`DocumentFragment`].
///
/// Implementations may sanitize before parsing but must keep `src`,
/// `data-embedded-img`, `data-src` and the vendor attribute intact.
pub trait FragmentBuilder {
    fn parse_fragment(&self, content: &str) -> DocumentFragment;
}

/// Plain html5ever fragment parsing via `scraper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFragmentBuilder;

impl FragmentBuilder for HtmlFragmentBuilder {
    fn parse_fragment(&self, content: &str) -> DocumentFragment {
        DocumentFragment::parse(content)
    }
}

/// Build a fragment for a message body with the default builder.
///
/// `None` is treated as an empty body.
pub fn materialize_body(content: Option<&str>) -> DocumentFragment {
    HtmlFragmentBuilder.parse_fragment(content.unwrap_or_default())
}
