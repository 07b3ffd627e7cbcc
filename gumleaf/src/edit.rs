//! Markup-driven edits: adjacent insertion, the inner/outer HTML setters, and
//! `textContent` assignment.
//!
//! Markup is always parsed into a fresh fragment first; the tree is only
//! touched once parsing is done, through the generic insertion primitive.

use crate::debug;
use crate::document::Document;
use crate::error::DomError;
use crate::mutation::MutationRecord;
use crate::namespace::HTML_NAMESPACE;
use crate::node::{ElementData, NodeData};
use html5ever::{LocalName, Namespace, QualName};
use indextree::NodeId;
use std::fmt;
use std::str::FromStr;
use tendril::StrTendril;

/// Where adjacent insertion puts new content, relative to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacentPosition {
    /// Before the element, among its parent's children
    BeforeBegin,
    /// First child
    AfterBegin,
    /// Last child
    BeforeEnd,
    /// After the element, among its parent's children
    AfterEnd,
}

impl AdjacentPosition {
    fn needs_parent(self) -> bool {
        matches!(self, AdjacentPosition::BeforeBegin | AdjacentPosition::AfterEnd)
    }
}

impl fmt::Display for AdjacentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdjacentPosition::BeforeBegin => "beforebegin",
            AdjacentPosition::AfterBegin => "afterbegin",
            AdjacentPosition::BeforeEnd => "beforeend",
            AdjacentPosition::AfterEnd => "afterend",
        })
    }
}

impl FromStr for AdjacentPosition {
    type Err = DomError;

    /// Positions are matched ASCII-case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beforebegin" => Ok(AdjacentPosition::BeforeBegin),
            "afterbegin" => Ok(AdjacentPosition::AfterBegin),
            "beforeend" => Ok(AdjacentPosition::BeforeEnd),
            "afterend" => Ok(AdjacentPosition::AfterEnd),
            _ => Err(DomError::syntax(s)),
        }
    }
}

fn html_context(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

/// The context an element provides for its own children. An HTML `<html>`
/// element parses like `<body>`.
fn element_context(elem: &ElementData) -> QualName {
    if elem.is_html_named("html") {
        html_context("body")
    } else {
        elem.name.clone()
    }
}

impl Document {
    /// Parsing context for markup that will become children of `parent`.
    fn context_for_parent(&self, parent: NodeId) -> Result<QualName, DomError> {
        match self.get(parent) {
            NodeData::Document => Err(DomError::NoModificationAllowed),
            NodeData::DocumentFragment | NodeData::ShadowRoot(_) => Ok(html_context("body")),
            NodeData::Element(elem) => Ok(element_context(elem)),
            other => Err(DomError::not_supported(&other.node_name())),
        }
    }

    /// Parent and reference child for `position`, resolved against the tree
    /// as it is now. `None` when the position needs a parent and there is none.
    fn adjacent_point(
        &self,
        element: NodeId,
        position: AdjacentPosition,
    ) -> Option<(NodeId, Option<NodeId>)> {
        match position {
            AdjacentPosition::BeforeBegin => Some((self.parent_node(element)?, Some(element))),
            AdjacentPosition::AfterBegin => Some((element, self.arena[element].first_child())),
            AdjacentPosition::BeforeEnd => Some((element, None)),
            AdjacentPosition::AfterEnd => {
                let parent = self.parent_node(element)?;
                let index = self.index_of(element)?;
                Some((parent, parent.children(&self.arena).nth(index + 1)))
            }
        }
    }

    /// Parse `markup` and insert the result at `position` relative to
    /// `element`.
    pub fn insert_adjacent_html(
        &mut self,
        element: NodeId,
        position: AdjacentPosition,
        markup: &str,
    ) -> Result<(), DomError> {
        let elem = self.element_or_err(element)?;
        let context = if position.needs_parent() {
            let parent = self.parent_node(element).ok_or(DomError::NoParent)?;
            self.context_for_parent(parent)?
        } else {
            element_context(elem)
        };
        debug!("insert_adjacent_html: {:?} {} ({} bytes)", element, position, markup.len());

        let fragment = self.parse_fragment(&context, markup);
        let (parent, reference) = self
            .adjacent_point(element, position)
            .ok_or(DomError::NoParent)?;
        self.insert_before(parent, fragment, reference)?;
        Ok(())
    }

    /// Insert an existing element at `position`. Returns `None` (and does
    /// nothing) when the position needs a parent and `element` has none.
    pub fn insert_adjacent_element(
        &mut self,
        element: NodeId,
        position: AdjacentPosition,
        node: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        self.element_or_err(element)?;
        self.element_or_err(node)?;
        self.insert_adjacent_node(element, position, node)
    }

    /// Insert a new text node at `position`. Returns `None` (and creates
    /// nothing) when the position needs a parent and `element` has none.
    pub fn insert_adjacent_text(
        &mut self,
        element: NodeId,
        position: AdjacentPosition,
        data: &str,
    ) -> Result<Option<NodeId>, DomError> {
        self.element_or_err(element)?;
        if position.needs_parent() && self.parent_node(element).is_none() {
            return Ok(None);
        }
        let text = self.create_text_node(data);
        self.insert_adjacent_node(element, position, text)
    }

    fn insert_adjacent_node(
        &mut self,
        element: NodeId,
        position: AdjacentPosition,
        node: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        let Some((parent, reference)) = self.adjacent_point(element, position) else {
            return Ok(None);
        };
        self.insert_before(parent, node, reference).map(Some)
    }

    /// Replace `element` with the nodes parsed from `markup`.
    ///
    /// Fails with `NoModificationAllowed` when the parent is the document and
    /// `NotSupported` when there is no parent at all; the tree is untouched
    /// in both cases.
    pub fn set_outer_html(&mut self, element: NodeId, markup: &str) -> Result<(), DomError> {
        let elem = self.element_or_err(element)?;
        let Some(parent) = self.parent_node(element) else {
            return Err(DomError::not_supported(&elem.tag_name()));
        };
        let context = self.context_for_parent(parent)?;
        debug!("set_outer_html: {:?} ({} bytes)", element, markup.len());

        let fragment = self.parse_fragment(&context, markup);
        self.insert_before(parent, fragment, Some(element))?;
        self.remove(element);
        Ok(())
    }

    /// Replace the children of an element (or a shadow root) with the nodes
    /// parsed from `markup`. Empty markup just clears.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        let context = match self.get(node) {
            NodeData::Element(elem) => elem.name.clone(),
            NodeData::ShadowRoot(data) => self.element_or_err(data.host)?.name.clone(),
            other => return Err(DomError::not_supported(&other.node_name())),
        };
        debug!("set_inner_html: {:?} ({} bytes)", node, markup.len());

        if markup.is_empty() {
            return self.replace_all(node, None);
        }
        let fragment = self.parse_fragment(&context, markup);
        self.replace_all(node, Some(fragment))
    }

    /// DOM `textContent` assignment.
    ///
    /// Containers get a single text node (or nothing, for empty/absent
    /// text); character nodes get their data replaced; the document and
    /// doctypes ignore it.
    pub fn set_text_content(&mut self, node: NodeId, value: Option<&str>) -> Result<(), DomError> {
        let value = value.unwrap_or_default();
        match self.get_mut(node) {
            NodeData::Text(data)
            | NodeData::Comment(data)
            | NodeData::ProcessingInstruction { data, .. } => {
                let old = std::mem::replace(data, StrTendril::from(value));
                self.queue_mutation(MutationRecord::character_data(node, &old));
                Ok(())
            }
            NodeData::Document | NodeData::Doctype { .. } => Ok(()),
            NodeData::Element(_) | NodeData::DocumentFragment | NodeData::ShadowRoot(_) => {
                let text = (!value.is_empty()).then(|| self.create_text_node(value));
                self.replace_all(node, text)
            }
        }
    }
}
