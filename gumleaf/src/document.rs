//! The document: node arena plus the per-document state element operations
//! consult (mutation queue, observers, shadow-root table, focus slot).
//!
//! Key features:
//! - **indextree Arena**: every node lives in one arena, identity is the `NodeId`
//! - **Detached nodes stay addressable**: nothing is freed while the document lives
//! - **Explicit collaborators**: observers are registered here, not looked up

use crate::debug;
use crate::error::DomError;
use crate::mutation::{AttributeObserver, MutationRecord};
use crate::name::{is_valid_name, validate_and_extract};
use crate::namespace::HTML_NAMESPACE;
use crate::node::{ElementData, NodeData};
use crate::parser::ParseOptions;
use crate::serialize::SerializeOptions;
use indextree::{Arena, NodeId};
use std::collections::HashMap;
use std::fmt;
use tendril::StrTendril;

/// A node tree and everything element operations need from the document.
pub struct Document {
    /// THE tree - all nodes live here
    pub(crate) arena: Arena<NodeData>,

    /// The `Document` node
    pub(crate) root: NodeId,

    /// Queued mutation records, oldest first
    pub(crate) mutations: Vec<MutationRecord>,

    /// Attribute observers in registration order
    pub(crate) observers: Vec<Box<dyn AttributeObserver>>,

    /// Host element -> shadow root. Entries are never removed.
    pub(crate) shadow_roots: HashMap<NodeId, NodeId>,

    /// Single focus slot
    pub(crate) focused: Option<NodeId>,

    pub(crate) parse_options: ParseOptions,
    pub(crate) serialize_options: SerializeOptions,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.count())
            .field("root", &self.root)
            .field("mutations", &self.mutations.len())
            .field("observers", &self.observers.len())
            .field("shadow_roots", &self.shadow_roots.len())
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: just the `Document` node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData::Document);
        Self::from_arena(arena, root)
    }

    pub(crate) fn from_arena(arena: Arena<NodeData>, root: NodeId) -> Self {
        Self {
            arena,
            root,
            mutations: Vec::new(),
            observers: Vec::new(),
            shadow_roots: HashMap::new(),
            focused: None,
            parse_options: ParseOptions::default(),
            serialize_options: SerializeOptions::default(),
        }
    }

    /// The `Document` node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Whether `id` names a node of this document.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some_and(|node| !node.is_removed())
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    pub fn set_parse_options(&mut self, options: ParseOptions) {
        self.parse_options = options;
    }

    pub fn serialize_options(&self) -> &SerializeOptions {
        &self.serialize_options
    }

    pub fn set_serialize_options(&mut self, options: SerializeOptions) {
        self.serialize_options = options;
    }

    pub(crate) fn new_node(&mut self, data: NodeData) -> NodeId {
        self.arena.new_node(data)
    }

    /// Create an HTML element. The name is ASCII-lowercased.
    pub fn create_element(&mut self, local_name: &str) -> Result<NodeId, DomError> {
        if !is_valid_name(local_name) {
            return Err(DomError::InvalidCharacter {
                value: local_name.to_string(),
            });
        }
        let local = local_name.to_ascii_lowercase();
        Ok(self.new_node(NodeData::Element(ElementData::html(&local))))
    }

    /// Create an element from a namespace and a qualified name.
    pub fn create_element_ns(
        &mut self,
        namespace: Option<&str>,
        qualified_name: &str,
    ) -> Result<NodeId, DomError> {
        let (prefix, local) = validate_and_extract(namespace, qualified_name)?;
        Ok(self.create_element_unchecked(prefix, namespace, local))
    }

    /// Create an element without validating the name.
    ///
    /// This is the only way to build an element with a prefix but no stored
    /// namespace; its namespace is then resolved through its ancestors.
    pub fn create_element_unchecked(
        &mut self,
        prefix: Option<&str>,
        namespace: Option<&str>,
        local_name: &str,
    ) -> NodeId {
        let elem = ElementData::with_namespace(prefix, namespace.unwrap_or_default(), local_name);
        self.new_node(NodeData::Element(elem))
    }

    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.new_node(NodeData::Text(StrTendril::from(data)))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.new_node(NodeData::Comment(StrTendril::from(data)))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.new_node(NodeData::DocumentFragment)
    }

    /// Register an observer. Observers are called in registration order.
    pub fn register_observer(&mut self, observer: impl AttributeObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub(crate) fn queue_mutation(&mut self, record: MutationRecord) {
        self.mutations.push(record);
    }

    /// Records queued since the last take, oldest first.
    pub fn mutation_records(&self) -> &[MutationRecord] {
        &self.mutations
    }

    /// Drain the mutation queue.
    pub fn take_mutation_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    /// Move focus to `element`. Returns false for non-elements.
    pub fn focus(&mut self, element: NodeId) -> bool {
        if !self.get(element).is_element() {
            return false;
        }
        debug!("focus -> {:?}", element);
        self.focused = Some(element);
        true
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn focused_element(&self) -> Option<NodeId> {
        self.focused
    }

    /// The element child of the `Document` node (usually `<html>`).
    pub fn document_element(&self) -> Option<NodeId> {
        self.root
            .children(&self.arena)
            .find(|&id| self.get(id).is_element())
    }

    fn html_child(&self, name: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        html.children(&self.arena).find(|&id| {
            self.get(id)
                .as_element()
                .is_some_and(|elem| elem.is_html_named(name))
        })
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.html_child("body")
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.html_child("head")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::SVG_NAMESPACE;

    #[test]
    fn test_create_element_lowercases() {
        let mut doc = Document::new();
        let div = doc.create_element("DiV").unwrap();
        let elem = doc.get(div).as_element().unwrap();
        assert_eq!(elem.local_name(), "div");
        assert_eq!(elem.namespace(), Some(HTML_NAMESPACE));
        assert_eq!(doc.parent_node(div), None);
    }

    #[test]
    fn test_create_element_rejects_bad_names() {
        let mut doc = Document::new();
        assert_eq!(
            doc.create_element("1div"),
            Err(DomError::InvalidCharacter {
                value: "1div".to_string()
            })
        );
        assert!(matches!(
            doc.create_element_ns(None, "svg:rect"),
            Err(DomError::Namespace { .. })
        ));
    }

    #[test]
    fn test_create_element_ns_keeps_case() {
        let mut doc = Document::new();
        let el = doc
            .create_element_ns(Some(SVG_NAMESPACE), "svg:foreignObject")
            .unwrap();
        let elem = doc.get(el).as_element().unwrap();
        assert_eq!(elem.prefix(), Some("svg"));
        assert_eq!(elem.local_name(), "foreignObject");
    }

    #[test]
    fn test_focus_slot() {
        let mut doc = Document::new();
        let div = doc.create_element("div").unwrap();
        let text = doc.create_text_node("x");
        assert!(!doc.focus(text));
        assert!(doc.focus(div));
        assert_eq!(doc.focused_element(), Some(div));
        doc.blur();
        assert_eq!(doc.focused_element(), None);
    }
}
