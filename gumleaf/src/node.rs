//! What lives in each arena slot.

use crate::attributes::Attributes;
use crate::namespace::HTML_NAMESPACE;
use crate::token_list::TokenList;
use html5ever::{LocalName, Namespace, Prefix, QualName};
use indextree::NodeId;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tendril::StrTendril;

/// Node kinds. Element-specific state lives only in [`ElementData`].
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root (parent of `<html>` and the doctype)
    Document,
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },
    /// Parentless container produced by fragment parsing
    DocumentFragment,
    /// Shadow root; reached through its host, never a child of it
    ShadowRoot(ShadowRootData),
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    Comment(StrTendril),
    ProcessingInstruction {
        target: StrTendril,
        data: StrTendril,
    },
}

impl NodeData {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeData::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeData::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeData::Text(_))
    }

    /// Document, fragment, and shadow root: containers without element semantics.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeData::Document | NodeData::DocumentFragment | NodeData::ShadowRoot(_)
        )
    }

    /// DOM `nodeName`.
    pub fn node_name(&self) -> Cow<'_, str> {
        match self {
            NodeData::Document => Cow::Borrowed("#document"),
            NodeData::Doctype { name, .. } => Cow::Borrowed(&**name),
            NodeData::DocumentFragment | NodeData::ShadowRoot(_) => {
                Cow::Borrowed("#document-fragment")
            }
            NodeData::Element(elem) => Cow::Owned(elem.tag_name()),
            NodeData::Text(_) => Cow::Borrowed("#text"),
            NodeData::Comment(_) => Cow::Borrowed("#comment"),
            NodeData::ProcessingInstruction { target, .. } => Cow::Borrowed(&**target),
        }
    }

    /// Drop per-element caches, for copying the node elsewhere.
    pub(crate) fn clone_for_copy(&self) -> NodeData {
        match self {
            NodeData::Element(elem) => NodeData::Element(ElementData {
                name: elem.name.clone(),
                attrs: Attributes::new(),
                class_list: None,
            }),
            other => other.clone(),
        }
    }
}

/// Element name plus attributes.
///
/// The name is fixed at construction; there is no setter.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub(crate) name: QualName,
    pub(crate) attrs: Attributes,
    /// Materialized on first `class_list` access
    pub(crate) class_list: Option<TokenList>,
}

/// HTML void elements: no children, no end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

impl ElementData {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            attrs: Attributes::new(),
            class_list: None,
        }
    }

    /// Element in the HTML namespace.
    pub fn html(local: &str) -> Self {
        Self::new(QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(local),
        ))
    }

    pub fn with_namespace(prefix: Option<&str>, namespace: &str, local: &str) -> Self {
        Self::new(QualName::new(
            prefix.map(Prefix::from),
            Namespace::from(namespace),
            LocalName::from(local),
        ))
    }

    pub fn name(&self) -> &QualName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.prefix.as_deref()
    }

    /// Namespace URI as stored, `None` when empty. See
    /// [`Document::namespace_uri`](crate::Document::namespace_uri) for the
    /// resolved form.
    pub fn namespace(&self) -> Option<&str> {
        let ns: &str = &self.name.ns;
        (!ns.is_empty()).then_some(ns)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attrs
    }

    pub fn is_html(&self) -> bool {
        &*self.name.ns == HTML_NAMESPACE
    }

    pub(crate) fn is_html_named(&self, local: &str) -> bool {
        self.is_html() && self.local_name() == local
    }

    pub fn is_void(&self) -> bool {
        self.is_html() && VOID_ELEMENTS.contains(&self.local_name())
    }

    /// Elements whose first leading line feed is swallowed by the parser.
    pub fn is_line_tolerant(&self) -> bool {
        self.is_html() && matches!(self.local_name(), "pre" | "textarea" | "listing")
    }

    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.prefix() {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.local_name())),
            None => Cow::Borrowed(self.local_name()),
        }
    }

    /// Qualified name, ASCII-uppercased for HTML elements.
    pub fn tag_name(&self) -> String {
        let qualified = self.qualified_name();
        if self.is_html() {
            qualified.to_ascii_uppercase()
        } else {
            qualified.into_owned()
        }
    }
}

/// Encapsulation mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl fmt::Display for ShadowRootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        })
    }
}

impl FromStr for ShadowRootMode {
    type Err = crate::DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ShadowRootMode::Open),
            "closed" => Ok(ShadowRootMode::Closed),
            _ => Err(crate::DomError::syntax(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowRootData {
    pub mode: ShadowRootMode,
    pub host: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::SVG_NAMESPACE;

    #[test]
    fn test_tag_name_case() {
        assert_eq!(ElementData::html("div").tag_name(), "DIV");
        let rect = ElementData::with_namespace(Some("svg"), SVG_NAMESPACE, "foreignObject");
        assert_eq!(rect.tag_name(), "svg:foreignObject");
        assert!(!rect.is_html());
    }

    #[test]
    fn test_void_and_line_tolerant() {
        assert!(ElementData::html("br").is_void());
        assert!(!ElementData::with_namespace(None, SVG_NAMESPACE, "br").is_void());
        assert!(ElementData::html("pre").is_line_tolerant());
        assert!(!ElementData::html("div").is_line_tolerant());
    }
}
