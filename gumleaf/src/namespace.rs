//! Namespace constants and prefix/namespace lookup through ancestor
//! declarations.
//!
//! Lookups are pure functions of the tree at call time; nothing is cached.

use crate::document::Document;
use crate::node::NodeData;
use indextree::NodeId;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

impl Document {
    /// The namespace bound to `prefix` (or the default namespace for `None`)
    /// as seen from `node`.
    pub fn locate_namespace(&self, node: NodeId, prefix: Option<&str>) -> Option<String> {
        let prefix = prefix.filter(|p| !p.is_empty());
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE.to_string()),
            Some("xmlns") => return Some(XMLNS_NAMESPACE.to_string()),
            _ => {}
        }

        let mut current = match self.get(node) {
            NodeData::Element(_) => Some(node),
            NodeData::Document => self.document_element(),
            NodeData::Doctype { .. } | NodeData::DocumentFragment | NodeData::ShadowRoot(_) => None,
            _ => self.parent_element(node),
        };

        while let Some(id) = current {
            let Some(elem) = self.get(id).as_element() else {
                break;
            };
            if elem.namespace().is_some() && elem.prefix() == prefix {
                return elem.namespace().map(str::to_string);
            }
            let declared = match prefix {
                Some(prefix) => elem
                    .attributes()
                    .iter()
                    .find(|a| {
                        a.namespace() == Some(XMLNS_NAMESPACE)
                            && a.prefix() == Some("xmlns")
                            && a.local_name() == prefix
                    }),
                None => elem.attributes().iter().find(|a| {
                    a.namespace() == Some(XMLNS_NAMESPACE)
                        && a.prefix().is_none()
                        && a.local_name() == "xmlns"
                }),
            };
            if let Some(attr) = declared {
                return (!attr.value().is_empty()).then(|| attr.value().to_string());
            }
            current = self.parent_element(id);
        }
        None
    }

    /// A prefix bound to `namespace` in scope at `element`.
    pub fn locate_prefix(&self, element: NodeId, namespace: &str) -> Option<String> {
        if namespace.is_empty() {
            return None;
        }
        let mut current = Some(element);
        while let Some(id) = current {
            let Some(elem) = self.get(id).as_element() else {
                break;
            };
            if elem.namespace() == Some(namespace)
                && let Some(prefix) = elem.prefix()
            {
                return Some(prefix.to_string());
            }
            let declared = elem.attributes().iter().find(|a| {
                a.prefix() == Some("xmlns") && a.value() == namespace
            });
            if let Some(attr) = declared {
                return Some(attr.local_name().to_string());
            }
            current = self.parent_element(id);
        }
        None
    }

    /// Split `qualified` into `(prefix, local)` for storage under `namespace`.
    ///
    /// An explicit `prefix:` wins; otherwise the prefix already bound to
    /// `namespace` in scope at `element` is used.
    pub fn split_qualified_name<'q>(
        &self,
        element: NodeId,
        qualified: &'q str,
        namespace: Option<&str>,
    ) -> (Option<String>, &'q str) {
        if let Some((prefix, local)) = qualified.split_once(':') {
            return (Some(prefix.to_string()), local);
        }
        let prefix = namespace
            .filter(|ns| !ns.is_empty())
            .and_then(|ns| self.locate_prefix(element, ns));
        (prefix, qualified)
    }

    /// Namespace URI of an element.
    ///
    /// Stored at construction; an element with a prefix but no stored
    /// namespace resolves it through its own and its ancestors' declarations.
    pub fn namespace_uri(&self, element: NodeId) -> Option<String> {
        let elem = self.get(element).as_element()?;
        if let Some(ns) = elem.namespace() {
            return Some(ns.to_string());
        }
        let prefix = elem.prefix()?;
        self.locate_namespace(element, Some(prefix))
    }
}
