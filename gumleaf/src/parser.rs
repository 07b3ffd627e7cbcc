//! HTML5 parsing straight into the document arena, via html5ever's
//! `TreeSink`.
//!
//! Parsed elements are populated silently. For fragments, the setup hook runs
//! once the fragment is assembled, so observers see each parsed element's
//! attributes exactly once.

use crate::attributes::Attr;
use crate::debug;
use crate::document::Document;
use crate::node::{ElementData, NodeData};
use crate::trace;
use html5ever::tree_builder::{
    ElemName, ElementFlags, NodeOrText, QuirksMode, TreeBuilderOpts, TreeSink,
};
use html5ever::tokenizer::TokenizerOpts;
use html5ever::{Attribute, LocalName, Namespace, ParseOpts, QualName};
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use tendril::{StrTendril, TendrilSink};

/// Options for HTML parsing.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Parse `<noscript>` content as raw text, as a scripting-enabled
    /// browser does (default: true)
    pub scripting_enabled: bool,
    /// Report exact (and slower to produce) parse error messages (default: false)
    pub exact_errors: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            scripting_enabled: true,
            exact_errors: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse as a browser with scripting disabled would.
    pub fn no_scripting(mut self) -> Self {
        self.scripting_enabled = false;
        self
    }

    pub fn exact_errors(mut self) -> Self {
        self.exact_errors = true;
        self
    }

    fn to_html5ever(&self) -> ParseOpts {
        ParseOpts {
            tokenizer: TokenizerOpts {
                exact_errors: self.exact_errors,
                ..Default::default()
            },
            tree_builder: TreeBuilderOpts {
                exact_errors: self.exact_errors,
                scripting_enabled: self.scripting_enabled,
                ..Default::default()
            },
        }
    }
}

impl Document {
    /// Parse a full HTML document.
    pub fn parse(html: &str) -> Document {
        Self::parse_with_options(html, ParseOptions::default())
    }

    pub fn parse_with_options(html: &str, options: ParseOptions) -> Document {
        debug!("parsing document ({} bytes)", html.len());
        let sink = ArenaSink::new(Arena::new());
        let output =
            html5ever::parse_document(sink, options.to_html5ever()).one(StrTendril::from(html));
        let mut doc = Document::from_arena(output.arena, output.document);
        doc.parse_options = options;
        doc
    }

    /// Parse `markup` as if it were the content of an element named
    /// `context`, returning a new (unattached) document fragment.
    pub fn parse_fragment(&mut self, context: &QualName, markup: &str) -> NodeId {
        debug!(
            "parsing fragment in <{}> context ({} bytes)",
            &*context.local,
            markup.len()
        );
        let opts = self.parse_options.to_html5ever();
        let scripting = self.parse_options.scripting_enabled;

        // The sink writes into our own arena, so node ids stay valid afterwards.
        let sink = ArenaSink::new(std::mem::take(&mut self.arena));
        let output = html5ever::parse_fragment(sink, opts, context.clone(), Vec::new(), scripting)
            .one(StrTendril::from(markup));
        self.arena = output.arena;

        // html5ever builds `#document > html > (parsed nodes)`.
        let fragment = self.new_node(NodeData::DocumentFragment);
        if let Some(html) = self.arena[output.document].first_child() {
            let parsed: Vec<NodeId> = html.children(&self.arena).collect();
            for node in parsed {
                self.append_silent(fragment, node);
            }
        }
        output.document.remove_subtree(&mut self.arena);
        if let Some(context) = output.context
            && self.parent_node(context).is_none()
        {
            context.remove_subtree(&mut self.arena);
        }

        let elements: Vec<NodeId> = self.descendant_elements(fragment).collect();
        for element in elements {
            self.run_setup_hook(element);
        }
        fragment
    }
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

struct SinkOutput {
    arena: Arena<NodeData>,
    document: NodeId,
    /// First element created: the context element when parsing a fragment
    context: Option<NodeId>,
}

/// TreeSink that builds nodes directly in a document arena
struct ArenaSink {
    /// Wrapped in RefCell: TreeSink methods take `&self`
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    first_element: Cell<Option<NodeId>>,
}

impl ArenaSink {
    fn new(mut arena: Arena<NodeData>) -> Self {
        let document = arena.new_node(NodeData::Document);
        ArenaSink {
            arena: RefCell::new(arena),
            document,
            first_element: Cell::new(None),
        }
    }

    fn new_text(arena: &mut Arena<NodeData>, text: StrTendril) -> NodeId {
        arena.new_node(NodeData::Text(text))
    }

    /// Append to `existing` if it is a text node. Returns whether it was.
    fn merge_text(arena: &mut Arena<NodeData>, existing: Option<NodeId>, text: &StrTendril) -> bool {
        if let Some(id) = existing
            && let NodeData::Text(data) = arena[id].get_mut()
        {
            data.push_tendril(text);
            return true;
        }
        false
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = SinkOutput;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        SinkOutput {
            arena: self.arena.into_inner(),
            document: self.document,
            context: self.first_element.get(),
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
        trace!("parse error: {}", _msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        match arena[*target].get() {
            NodeData::Element(elem) => OwnedElemName(elem.name().clone()),
            _ => OwnedElemName(QualName::new(
                None,
                Namespace::from(""),
                LocalName::from(""),
            )),
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut elem = ElementData::new(name);
        for attr in attrs {
            elem.attrs.push_if_missing(Attr {
                name: attr.name,
                value: attr.value,
            });
        }
        let id = self.arena.borrow_mut().new_node(NodeData::Element(elem));
        if self.first_element.get().is_none() {
            self.first_element.set(Some(id));
        }
        id
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData::Comment(text))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        self.arena
            .borrow_mut()
            .new_node(NodeData::ProcessingInstruction { target, data })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with previous text node (html5ever behavior)
                let last_child = arena[*parent].last_child();
                if Self::merge_text(&mut arena, last_child, &text) {
                    return;
                }
                let text_node = Self::new_text(&mut arena, text);
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                let previous = arena[*sibling].previous_sibling();
                if Self::merge_text(&mut arena, previous, &text) {
                    return;
                }
                let text_node = Self::new_text(&mut arena, text);
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.arena.borrow()[*element].parent().is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut arena = self.arena.borrow_mut();
        let doctype = arena.new_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        });
        self.document.append(doctype, &mut arena);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template content is kept inline as ordinary children
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let Some(elem) = arena[*target].get_mut().as_element_mut() {
            for attr in attrs {
                elem.attrs.push_if_missing(Attr {
                    name: attr.name,
                    value: attr.value,
                });
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&*arena).collect();
        for child in children {
            new_parent.append(child, &mut arena);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{HTML_NAMESPACE, SVG_NAMESPACE, XLINK_NAMESPACE};

    fn body_context() -> QualName {
        QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"))
    }

    #[test]
    fn test_parse_simple_html() {
        let doc = Document::parse("<html><body><p>Hello</p></body></html>");
        let html = doc.document_element().expect("should have html");
        assert_eq!(doc.local_name(html), Some("html"));

        let body = doc.body().expect("should have body");
        let p = doc.first_element_child(body).expect("body should have child");
        assert_eq!(doc.local_name(p), Some("p"));
        assert_eq!(doc.text_content(p).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_parse_doctype() {
        let doc = Document::parse("<!DOCTYPE html><html><body></body></html>");
        let first = doc.child_nodes(doc.root()).next().unwrap();
        match doc.get(first) {
            NodeData::Doctype { name, .. } => assert_eq!(&**name, "html"),
            other => panic!("expected doctype, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_foreign_attributes() {
        let doc = Document::parse(
            r##"<body><svg viewBox="0 0 1 1"><use xlink:href="#a"/></svg></body>"##,
        );
        let body = doc.body().unwrap();
        let svg = doc.first_element_child(body).unwrap();
        let elem = doc.get(svg).as_element().unwrap();
        assert_eq!(elem.namespace(), Some(SVG_NAMESPACE));
        assert_eq!(doc.get_attribute(svg, "viewBox"), Some("0 0 1 1"));

        let use_el = doc.first_element_child(svg).unwrap();
        assert_eq!(
            doc.get_attribute_ns(use_el, Some(XLINK_NAMESPACE), "href"),
            Some("#a")
        );
        assert_eq!(doc.attribute_names(use_el), vec!["xlink:href"]);
    }

    #[test]
    fn test_fragment_lands_in_own_arena() {
        let mut doc = Document::new();
        let before = doc.arena.count();
        let frag = doc.parse_fragment(&body_context(), "<b>x</b>text<i></i>");

        let kids: Vec<_> = doc.child_nodes(frag).collect();
        assert_eq!(kids.len(), 3);
        assert_eq!(doc.local_name(kids[0]), Some("b"));
        assert!(doc.get(kids[1]).is_text());
        assert!(doc.arena.count() > before);
        assert!(doc.mutation_records().is_empty());
    }

    #[test]
    fn test_fragment_context_changes_parse() {
        let mut doc = Document::new();
        let tr = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("tr"));
        let frag = doc.parse_fragment(&tr, "<td>cell</td>");
        let td = doc.first_element_child(frag).unwrap();
        assert_eq!(doc.local_name(td), Some("td"));

        // In body context the table cell tags are dropped
        let frag = doc.parse_fragment(&body_context(), "<td>cell</td>");
        assert_eq!(doc.first_element_child(frag), None);
        assert_eq!(doc.text_content(frag).as_deref(), Some("cell"));
    }

    #[test]
    fn test_fragment_runs_setup_hook() {
        let mut doc = Document::new();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = seen.clone();
        doc.register_observer(move |_: NodeId, _: &str, _: Option<&str>| {
            counter.set(counter.get() + 1);
        });
        doc.parse_fragment(&body_context(), r#"<p id="a" class="b"><span title="c"></span></p>"#);
        assert_eq!(seen.get(), 3);
    }
}
