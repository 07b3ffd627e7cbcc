//! HTML5-correct serialization of arena nodes.
//!
//! The walk decides structure (which tags, in what order, whether an element
//! is written in self-closing form) and hands every piece of markup to a
//! [`MarkupFormatter`], which owns escaping and quoting. [`HtmlFormatter`]
//! follows HTML5 rules:
//!
//! - Void elements never get end tags
//! - Text content is properly escaped
//! - Attribute values are escaped and double-quoted
//! - Raw text elements (script, style, ...) are not escaped
//! - RCDATA elements (title, textarea) escape only `&` and `<`
//! - Foreign content (SVG/MathML) without children uses self-closing syntax

use crate::attributes::Attr;
use crate::document::Document;
use crate::node::{ElementData, NodeData};
use indextree::NodeId;

/// Options for HTML serialization.
#[derive(Clone, Debug)]
pub struct SerializeOptions {
    /// Whether to sort attributes by qualified name (default: false).
    /// When false, attributes are written in insertion order.
    pub sort_attributes: bool,
    /// Whether to escape `</script` sequences in script content (default: true for safety)
    pub escape_script_end_tags: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            sort_attributes: false,
            escape_script_end_tags: true,
        }
    }
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable sorting attributes alphabetically for deterministic output.
    pub fn sort_attributes(mut self) -> Self {
        self.sort_attributes = true;
        self
    }

    /// Disable escaping `</script` in script content (not recommended).
    pub fn no_escape_script_end_tags(mut self) -> Self {
        self.escape_script_end_tags = false;
        self
    }
}

/// Writes the markup for individual pieces of a tree.
pub trait MarkupFormatter {
    /// Open tag. `self_closing` means no children and no close tag follow.
    fn open_tag(&mut self, out: &mut String, element: &ElementData, self_closing: bool);

    fn close_tag(&mut self, out: &mut String, element: &ElementData);

    /// Text, escaped according to its parent element (if any).
    fn text(&mut self, out: &mut String, parent: Option<&ElementData>, text: &str);

    fn comment(&mut self, out: &mut String, text: &str) {
        out.push_str("<!--");
        out.push_str(text);
        out.push_str("-->");
    }

    fn doctype(&mut self, out: &mut String, name: &str) {
        out.push_str("<!DOCTYPE ");
        out.push_str(name);
        out.push('>');
    }

    fn processing_instruction(&mut self, out: &mut String, target: &str, data: &str) {
        out.push_str("<?");
        out.push_str(target);
        out.push(' ');
        out.push_str(data);
        out.push('>');
    }
}

/// Raw text elements - content is not escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// RCDATA elements - only `&` and `<` are escaped.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

/// The HTML5 formatter.
#[derive(Clone, Debug, Default)]
pub struct HtmlFormatter {
    options: SerializeOptions,
}

impl HtmlFormatter {
    pub fn new(options: SerializeOptions) -> Self {
        Self { options }
    }

    fn write_attr(out: &mut String, attr: &Attr) {
        out.push(' ');
        out.push_str(&attr.qualified_name());
        out.push_str("=\"");
        for c in attr.value().chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
        out.push('"');
    }

    /// Escape text content for normal HTML elements.
    fn write_text_escaped(out: &mut String, text: &str) {
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
        }
    }

    /// Escape text content for RCDATA elements (only & and <).
    fn write_rcdata_escaped(out: &mut String, text: &str) {
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                _ => out.push(c),
            }
        }
    }

    /// Write raw text content, optionally escaping script end tags.
    fn write_raw_text(&self, out: &mut String, text: &str, tag: &str) {
        if !(self.options.escape_script_end_tags && tag == "script") {
            out.push_str(text);
            return;
        }
        // ASCII case-insensitive matching on the original bytes, so indices
        // stay aligned with `text`
        const PATTERN: &[u8] = b"</script";
        let bytes = text.as_bytes();
        let mut last_end = 0;
        let mut i = 0;
        while i + PATTERN.len() <= bytes.len() {
            if bytes[i..i + PATTERN.len()].eq_ignore_ascii_case(PATTERN) {
                out.push_str(&text[last_end..i]);
                out.push_str("<\\/script");
                i += PATTERN.len();
                last_end = i;
            } else {
                i += 1;
            }
        }
        out.push_str(&text[last_end..]);
    }
}

impl MarkupFormatter for HtmlFormatter {
    fn open_tag(&mut self, out: &mut String, element: &ElementData, self_closing: bool) {
        out.push('<');
        out.push_str(&element.qualified_name());

        if self.options.sort_attributes {
            let mut attrs: Vec<&Attr> = element.attributes().iter().collect();
            attrs.sort_by(|a, b| a.qualified_name().cmp(&b.qualified_name()));
            for attr in attrs {
                Self::write_attr(out, attr);
            }
        } else {
            for attr in element.attributes() {
                Self::write_attr(out, attr);
            }
        }

        if self_closing && !element.is_html() {
            out.push_str("/>");
        } else {
            out.push('>');
        }
    }

    fn close_tag(&mut self, out: &mut String, element: &ElementData) {
        out.push_str("</");
        out.push_str(&element.qualified_name());
        out.push('>');
    }

    fn text(&mut self, out: &mut String, parent: Option<&ElementData>, text: &str) {
        match parent.filter(|p| p.is_html()).map(ElementData::local_name) {
            Some(tag) if RAW_TEXT_ELEMENTS.contains(&tag) => self.write_raw_text(out, text, tag),
            Some(tag) if RCDATA_ELEMENTS.contains(&tag) => Self::write_rcdata_escaped(out, text),
            _ => Self::write_text_escaped(out, text),
        }
    }
}

impl Document {
    /// The node's own markup plus its descendants'.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut formatter = HtmlFormatter::new(self.serialize_options.clone());
        self.serialize_with(node, true, &mut formatter)
    }

    /// Markup of the node's children.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut formatter = HtmlFormatter::new(self.serialize_options.clone());
        self.serialize_with(node, false, &mut formatter)
    }

    /// Serialize the whole document, doctype included.
    pub fn to_html(&self) -> String {
        self.outer_html(self.root)
    }

    /// Serialize with a custom formatter. `include_self` selects outer vs
    /// inner markup.
    pub fn serialize_with(
        &self,
        node: NodeId,
        include_self: bool,
        formatter: &mut dyn MarkupFormatter,
    ) -> String {
        let mut out = String::new();
        if include_self {
            self.write_node(&mut out, node, formatter);
        } else {
            self.write_children(&mut out, node, formatter);
        }
        out
    }

    fn write_children(&self, out: &mut String, node: NodeId, formatter: &mut dyn MarkupFormatter) {
        for child in node.children(&self.arena) {
            self.write_node(out, child, formatter);
        }
    }

    fn write_node(&self, out: &mut String, node: NodeId, formatter: &mut dyn MarkupFormatter) {
        match self.get(node) {
            NodeData::Document | NodeData::DocumentFragment | NodeData::ShadowRoot(_) => {
                self.write_children(out, node, formatter);
            }
            NodeData::Doctype { name, .. } => formatter.doctype(out, name),
            NodeData::Element(elem) => self.write_element(out, node, elem, formatter),
            NodeData::Text(text) => {
                let parent = self
                    .parent_node(node)
                    .and_then(|parent| self.get(parent).as_element());
                formatter.text(out, parent, text);
            }
            NodeData::Comment(text) => formatter.comment(out, text),
            NodeData::ProcessingInstruction { target, data } => {
                formatter.processing_instruction(out, target, data)
            }
        }
    }

    fn write_element(
        &self,
        out: &mut String,
        node: NodeId,
        elem: &ElementData,
        formatter: &mut dyn MarkupFormatter,
    ) {
        let first_child = self.arena[node].first_child();
        let self_closing = elem.is_void() || (!elem.is_html() && first_child.is_none());
        formatter.open_tag(out, elem, self_closing);
        if self_closing {
            return;
        }

        // The parser drops one leading newline in these elements, so write
        // an extra one to keep a newline that is really there.
        if elem.is_line_tolerant()
            && let Some(first) = first_child
            && let NodeData::Text(text) = self.get(first)
            && text.starts_with('\n')
        {
            out.push('\n');
        }

        self.write_children(out, node, formatter);
        formatter.close_tag(out, elem);
    }
}
