//! Read-only navigation relative to a node.
//!
//! Sibling and child queries are linear scans over the current child list;
//! no secondary index is kept, so results always reflect the tree as it is.

use crate::document::Document;
use crate::node::NodeData;
use indextree::NodeId;

impl Document {
    /// Parent, if it is an element.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent_node(node)
            .filter(|&parent| self.get(parent).is_element())
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.parent_node(node)?;
        node.preceding_siblings(&self.arena)
            .skip(1)
            .find(|&id| self.get(id).is_element())
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.parent_node(node)?;
        node.following_siblings(&self.arena)
            .skip(1)
            .find(|&id| self.get(id).is_element())
    }

    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        node.children(&self.arena)
            .find(|&id| self.get(id).is_element())
    }

    pub fn last_element_child(&self, node: NodeId) -> Option<NodeId> {
        node.children(&self.arena).rev()
            .find(|&id| self.get(id).is_element())
    }

    /// Counted on every call.
    pub fn child_element_count(&self, node: NodeId) -> usize {
        node.children(&self.arena)
            .filter(|&id| self.get(id).is_element())
            .count()
    }

    /// Live view of the element children of `node`.
    pub fn children(&self, node: NodeId) -> Children<'_> {
        Children { doc: self, parent: node }
    }

    /// `node` and everything below it, in document order. Shadow trees are
    /// not entered.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    /// Element descendants of `node` (excluding `node`), in document order.
    pub fn descendant_elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
            .skip(1)
            .filter(|&id| self.get(id).is_element())
    }

    /// DOM `textContent`: concatenated descendant text for elements and
    /// containers, the data itself for character nodes, `None` for the
    /// document and doctypes.
    pub fn text_content(&self, node: NodeId) -> Option<String> {
        match self.get(node) {
            NodeData::Document | NodeData::Doctype { .. } => None,
            NodeData::Text(data) | NodeData::Comment(data) => Some(data.to_string()),
            NodeData::ProcessingInstruction { data, .. } => Some(data.to_string()),
            NodeData::Element(_) | NodeData::DocumentFragment | NodeData::ShadowRoot(_) => {
                let mut out = String::new();
                for id in node.descendants(&self.arena) {
                    if let NodeData::Text(text) = self.get(id) {
                        out.push_str(text);
                    }
                }
                Some(out)
            }
        }
    }
}

/// Element children of one node, recomputed on every read.
#[derive(Clone, Copy)]
pub struct Children<'a> {
    doc: &'a Document,
    parent: NodeId,
}

impl<'a> Children<'a> {
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + 'a {
        let doc = self.doc;
        self.parent
            .children(&doc.arena)
            .filter(move |&id| doc.get(id).is_element())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn item(&self, index: usize) -> Option<NodeId> {
        self.iter().nth(index)
    }

    /// First element whose `id` is `key`, or an HTML element whose `name` is.
    pub fn named_item(&self, key: &str) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }
        let doc = self.doc;
        self.iter().find(|&id| {
            doc.get(id).as_element().is_some_and(|elem| {
                elem.attributes().get_ns(None, "id") == Some(key)
                    || (elem.is_html() && elem.attributes().get_ns(None, "name") == Some(key))
            })
        })
    }
}

impl<'a> IntoIterator for Children<'a> {
    type Item = NodeId;
    type IntoIter = Box<dyn Iterator<Item = NodeId> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        let t1 = doc.create_text_node("a");
        let e1 = doc.create_element("p").unwrap();
        let c = doc.create_comment("c");
        let e2 = doc.create_element("span").unwrap();
        let t2 = doc.create_text_node("b");
        for node in [t1, e1, c, e2, t2] {
            doc.append_child(parent, node).unwrap();
        }
        (doc, parent, vec![t1, e1, c, e2, t2])
    }

    #[test]
    fn test_element_siblings_skip_other_nodes() {
        let (doc, parent, nodes) = build();
        let (e1, e2) = (nodes[1], nodes[3]);

        assert_eq!(doc.next_element_sibling(e1), Some(e2));
        assert_eq!(doc.previous_element_sibling(e2), Some(e1));
        assert_eq!(doc.previous_element_sibling(e1), None);
        assert_eq!(doc.next_element_sibling(e2), None);
        assert_eq!(doc.first_element_child(parent), Some(e1));
        assert_eq!(doc.last_element_child(parent), Some(e2));
        assert_eq!(doc.child_element_count(parent), 2);
    }

    #[test]
    fn test_children_view_is_live() {
        let (mut doc, parent, nodes) = build();
        assert_eq!(doc.children(parent).len(), 2);

        let extra = doc.create_element("em").unwrap();
        doc.append_child(parent, extra).unwrap();
        doc.set_attribute(extra, "id", "last").unwrap();

        let children = doc.children(parent);
        assert_eq!(children.len(), 3);
        assert_eq!(children.item(0), Some(nodes[1]));
        assert_eq!(children.item(2), Some(extra));
        assert_eq!(children.item(3), None);
        assert_eq!(children.named_item("last"), Some(extra));
        assert_eq!(children.into_iter().count(), 3);
    }

    #[test]
    fn test_text_content_is_deep() {
        let (mut doc, parent, nodes) = build();
        let inner = doc.create_text_node("-inner-");
        doc.append_child(nodes[1], inner).unwrap();

        assert_eq!(doc.text_content(parent).as_deref(), Some("a-inner-b"));
        assert_eq!(doc.text_content(nodes[2]).as_deref(), Some("c"));
        assert_eq!(doc.text_content(doc.root()), None);
    }
}
