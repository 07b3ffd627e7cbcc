//! Selector support for `matches`, `closest`, and `query_selector(_all)`.
//!
//! Parsing and matching are done by the `selectors` crate; this module
//! supplies the `SelectorImpl` and a `selectors::Element` view of arena
//! elements.
//!
//! Beyond what the crate parses natively (combinators, type/id/class and
//! attribute selectors, `:not`, `:is`, `:where`, `:scope`, `:root`,
//! `:empty`, and the structural pseudo-classes), `:focus`, `:link`,
//! `:any-link`, and `:visited` are recognized. Pseudo-elements are a syntax
//! error.

use crate::document::Document;
use crate::error::DomError;
use crate::namespace::HTML_NAMESPACE;
use crate::node::{ElementData, NodeData};
use crate::trace;
use cssparser::{CowRcStr, ParseError, ParserInput, SourceLocation, ToCss};
use indextree::NodeId;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, QuirksMode, SelectorCaches, matches_selector_list,
};
use selectors::parser::{ParseRelative, SelectorParseErrorKind};
use selectors::{Element, OpaqueElement};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::str::FromStr;

// ============================================================================
// Selector implementation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GumleafSelectorImpl;

impl selectors::parser::SelectorImpl for GumleafSelectorImpl {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssString;
    type NamespacePrefix = CssString;
    type NamespaceUrl = CssString;
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = str;

    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

/// Owned string satisfying the `selectors` bounds for names and values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssString(String);

impl CssString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CssString {
    fn from(s: &str) -> Self {
        CssString(s.to_string())
    }
}

impl Borrow<str> for CssString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_identifier(&self.0, dest)
    }
}

impl precomputed_hash::PrecomputedHash for CssString {
    fn precomputed_hash(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    Focus,
    Link,
    AnyLink,
    Visited,
}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
    type Impl = GumleafSelectorImpl;

    fn is_active_or_hover(&self) -> bool {
        false
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, PseudoClass::Focus)
    }
}

impl ToCss for PseudoClass {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(match self {
            PseudoClass::Focus => ":focus",
            PseudoClass::Link => ":link",
            PseudoClass::AnyLink => ":any-link",
            PseudoClass::Visited => ":visited",
        })
    }
}

/// No pseudo-elements are supported; nothing in a DOM query can match one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = GumleafSelectorImpl;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = GumleafSelectorImpl;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoClass, ParseError<'i, Self::Error>> {
        cssparser::match_ignore_ascii_case! { &*name,
            "focus" => Ok(PseudoClass::Focus),
            "link" => Ok(PseudoClass::Link),
            "any-link" => Ok(PseudoClass::AnyLink),
            "visited" => Ok(PseudoClass::Visited),
            _ => Err(location.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name.clone()),
            )),
        }
    }

    fn parse_is_and_where(&self) -> bool {
        true
    }
}

// ============================================================================
// Compiled selector lists
// ============================================================================

/// One or more comma-separated selectors.
#[derive(Debug, Clone)]
pub struct SelectorList(selectors::parser::SelectorList<GumleafSelectorImpl>);

impl SelectorList {
    /// Compile selector text.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let mut input = ParserInput::new(text);
        let mut parser = cssparser::Parser::new(&mut input);
        let list = parser
            .parse_entirely(|parser| {
                selectors::parser::SelectorList::parse(
                    &SelectorParser,
                    parser,
                    ParseRelative::No,
                )
            })
            .map_err(|_err| {
                trace!("selector {:?} rejected: {:?}", text, _err);
                DomError::syntax(text)
            })?;
        trace!("compiled selector {:?}", text);
        Ok(SelectorList(list))
    }

    /// Whether `element` matches any selector in the list. `scope` is the
    /// element `:scope` refers to; without one it means `:root`.
    pub fn matches(&self, doc: &Document, element: NodeId, scope: Option<NodeId>) -> bool {
        if !doc.get(element).is_element() {
            return false;
        }
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        context.scope_element = scope.map(|id| ElementRef::new(doc, id).opaque());
        matches_selector_list(&self.0, &ElementRef::new(doc, element), &mut context)
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Element view
// ============================================================================

/// An element of a document, as the matcher sees it.
#[derive(Debug, Clone, Copy)]
struct ElementRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn at(&self, id: NodeId) -> Self {
        Self::new(self.doc, id)
    }

    fn data(&self) -> Option<&'a ElementData> {
        self.doc.get(self.id).as_element()
    }

    fn attr(&self, local: &str) -> Option<&'a str> {
        self.data()?.attributes().get_ns(None, local)
    }

    fn is_html(&self) -> bool {
        self.data().is_some_and(ElementData::is_html)
    }
}

impl<'a> Element for ElementRef<'a> {
    type Impl = GumleafSelectorImpl;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.doc.get(self.id))
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc.parent_element(self.id).map(|id| self.at(id))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        self.doc
            .parent_node(self.id)
            .is_some_and(|parent| matches!(self.doc.get(parent), NodeData::ShadowRoot(_)))
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        let mut current = self.doc.parent_node(self.id);
        while let Some(id) = current {
            if let NodeData::ShadowRoot(data) = self.doc.get(id) {
                return Some(self.at(data.host));
            }
            current = self.doc.parent_node(id);
        }
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.doc.previous_element_sibling(self.id).map(|id| self.at(id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.doc.next_element_sibling(self.id).map(|id| self.at(id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc.first_element_child(self.id).map(|id| self.at(id))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        self.is_html()
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.data().is_some_and(|elem| elem.local_name() == local_name)
    }

    fn has_namespace(&self, ns: &str) -> bool {
        self.data()
            .is_some_and(|elem| elem.namespace().unwrap_or_default() == ns)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        match (self.data(), other.data()) {
            (Some(a), Some(b)) => {
                a.local_name() == b.local_name() && a.namespace() == b.namespace()
            }
            _ => false,
        }
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssString>,
        local_name: &CssString,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        let Some(elem) = self.data() else {
            return false;
        };
        let local_name = local_name.as_str();
        let check = |value: &str| match operation {
            AttrSelectorOperation::Exists => true,
            AttrSelectorOperation::WithValue {
                operator,
                case_sensitivity,
                value: expected,
            } => operator.eval_str(value, expected.as_str(), *case_sensitivity),
        };
        match ns {
            NamespaceConstraint::Any => elem
                .attributes()
                .iter()
                .filter(|attr| attr.local_name() == local_name)
                .any(|attr| check(attr.value())),
            NamespaceConstraint::Specific(url) => {
                let url = url.as_str();
                let namespace = (!url.is_empty()).then_some(url);
                elem.attributes()
                    .get_ns(namespace, local_name)
                    .is_some_and(check)
            }
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pseudo: &PseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match pseudo {
            PseudoClass::Focus => self.doc.focused_element() == Some(self.id),
            PseudoClass::Link | PseudoClass::AnyLink => self.is_link(),
            PseudoClass::Visited => false,
        }
    }

    fn match_pseudo_element(
        &self,
        pseudo: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pseudo {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        let Some(elem) = self.data() else {
            return false;
        };
        elem.namespace() == Some(HTML_NAMESPACE)
            && matches!(elem.local_name(), "a" | "area" | "link")
            && self.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.data().is_some_and(|elem| elem.is_html_named("slot"))
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("id")
            .is_some_and(|actual| case_sensitivity.eq(actual.as_bytes(), id.as_str().as_bytes()))
    }

    fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("class").is_some_and(|classes| {
            classes
                .split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.as_str().as_bytes()))
        })
    }

    fn has_custom_state(&self, _name: &CssString) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc
            .child_nodes(self.id)
            .all(|child| match self.doc.get(child) {
                NodeData::Element(_) => false,
                NodeData::Text(text) => text.is_empty(),
                _ => true,
            })
    }

    fn is_root(&self) -> bool {
        self.doc
            .parent_node(self.id)
            .is_some_and(|parent| matches!(self.doc.get(parent), NodeData::Document))
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

// ============================================================================
// Document entry points
// ============================================================================

impl Document {
    /// Whether `element` matches `selectors`, with itself as `:scope`.
    pub fn matches(&self, element: NodeId, selectors: &str) -> Result<bool, DomError> {
        let list = SelectorList::parse(selectors)?;
        self.element_or_err(element)?;
        Ok(list.matches(self, element, Some(element)))
    }

    /// Nearest inclusive ancestor element matching `selectors`, with
    /// `element` as `:scope`.
    pub fn closest(&self, element: NodeId, selectors: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selectors)?;
        self.element_or_err(element)?;
        let mut current = Some(element);
        while let Some(candidate) = current {
            if list.matches(self, candidate, Some(element)) {
                return Ok(Some(candidate));
            }
            current = self.parent_element(candidate);
        }
        Ok(None)
    }

    /// First descendant element of `node` matching `selectors`, in document
    /// order.
    pub fn query_selector(&self, node: NodeId, selectors: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selectors)?;
        let scope = self.get(node).is_element().then_some(node);
        Ok(self
            .descendant_elements(node)
            .find(|&id| list.matches(self, id, scope)))
    }

    /// Every descendant element of `node` matching `selectors`, in document
    /// order.
    pub fn query_selector_all(&self, node: NodeId, selectors: &str) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selectors)?;
        let scope = self.get(node).is_element().then_some(node);
        Ok(self
            .descendant_elements(node)
            .filter(|&id| list.matches(self, id, scope))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><body>
        <div id="main" class="box wide">
            <p class="intro" lang="en-US">one</p>
            <p data-kind="Note">two</p>
            <span></span>
            <p>three</p>
        </div>
        <ul><li>a</li><li class="sel">b</li><li>c</li></ul>
    </body></html>"#;

    fn page() -> Document {
        Document::parse(PAGE)
    }

    fn select(doc: &Document, selectors: &str) -> Vec<String> {
        doc.query_selector_all(doc.root(), selectors)
            .unwrap()
            .into_iter()
            .map(|id| doc.text_content(id).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "", " ", "div >", "> div", "a,,b", "#", ".1x", "[", "[a=]", "[a=b x]", "p::before",
            ":hover", "div)", "a | b", "svg|rect",
        ] {
            assert!(
                matches!(SelectorList::parse(bad), Err(DomError::Syntax { .. })),
                "{bad:?} should not parse"
            );
        }
        for good in [
            "*",
            "div.a#b",
            "a > b + c ~ d e",
            "[x|=en i]",
            ":not(.a, #b)",
            r"#\31 23",
            ":is(p, li):where(.sel)",
            "A:ANY-LINK",
        ] {
            assert!(good.parse::<SelectorList>().is_ok(), "{good:?} should parse");
        }
    }

    #[test]
    fn test_type_class_id() {
        let doc = page();
        assert_eq!(select(&doc, "P.intro"), ["one"]);
        assert_eq!(select(&doc, "#main > p:last-child, li.sel"), ["three", "b"]);
        assert_eq!(select(&doc, ".wide p"), ["one", "two", "three"]);
        assert!(select(&doc, ".box.missing").is_empty());
    }

    #[test]
    fn test_combinators() {
        let doc = page();
        assert_eq!(select(&doc, "p + p"), ["two"]);
        assert_eq!(select(&doc, "span ~ p"), ["three"]);
        assert_eq!(select(&doc, "li:first-child"), ["a"]);
        assert_eq!(select(&doc, "li:not(:first-child):not(:last-child)"), ["b"]);
        assert_eq!(select(&doc, "body > ul > li:only-child").len(), 0);
        assert_eq!(select(&doc, ":is(ul, div) > :where(.sel, .intro)"), ["one", "b"]);
    }

    #[test]
    fn test_attribute_operators() {
        let doc = page();
        assert_eq!(select(&doc, "[lang|=en]"), ["one"]);
        assert_eq!(select(&doc, "[data-kind=note]").len(), 0);
        assert_eq!(select(&doc, "[data-kind=note i]"), ["two"]);
        assert_eq!(select(&doc, "[class~=intro]"), ["one"]);
        assert_eq!(select(&doc, "[lang^=en]"), ["one"]);
        assert_eq!(select(&doc, "[lang$='-US']"), ["one"]);
        assert_eq!(select(&doc, "[lang*=\"n-U\"]"), ["one"]);
        assert_eq!(select(&doc, "[lang^='']").len(), 0);
    }

    #[test]
    fn test_empty_and_root() {
        let doc = page();
        let span = doc.query_selector(doc.root(), "span:empty").unwrap();
        assert_eq!(doc.local_name(span.unwrap()), Some("span"));
        let html = doc.query_selector(doc.root(), ":root").unwrap();
        assert_eq!(html, doc.document_element());
    }

    #[test]
    fn test_matches_and_closest_use_scope() {
        let doc = page();
        let li = doc.query_selector(doc.root(), "li.sel").unwrap().unwrap();
        let ul = doc.parent_element(li).unwrap();

        assert_eq!(doc.matches(li, "ul > li"), Ok(true));
        assert_eq!(doc.matches(li, ":scope"), Ok(true));
        assert_eq!(doc.closest(li, "ul"), Ok(Some(ul)));
        assert_eq!(doc.closest(li, "li"), Ok(Some(li)));
        assert_eq!(doc.closest(li, "table"), Ok(None));
        assert!(matches!(doc.closest(li, "li["), Err(DomError::Syntax { .. })));

        // `:scope` in a query is the element queried from
        let found = doc.query_selector_all(ul, ":scope > li").unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(doc.query_selector_all(ul, ":scope").unwrap().len(), 0);
    }

    #[test]
    fn test_detached_element_is_first_child() {
        let mut doc = Document::new();
        let el = doc.create_element("div").unwrap();
        assert_eq!(doc.matches(el, "div:first-child:only-child"), Ok(true));
        assert_eq!(doc.matches(el, ":root"), Ok(false));
    }

    #[test]
    fn test_query_in_fragment() {
        let mut doc = Document::new();
        let frag = doc.create_document_fragment();
        let div = doc.create_element("div").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(frag, div).unwrap();
        doc.append_child(div, b).unwrap();

        assert_eq!(doc.query_selector(frag, "div b"), Ok(Some(b)));
        assert_eq!(doc.query_selector(frag, "b:first-child"), Ok(Some(b)));
    }

    #[test]
    fn test_focus_and_links() {
        let mut doc = Document::parse(
            r#"<html><body><a id="x" href="/x">x</a><a id="y">y</a><input></body></html>"#,
        );
        let links = doc.query_selector_all(doc.root(), "a:any-link").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(doc.id(links[0]), "x");
        assert!(doc.query_selector(doc.root(), ":visited").unwrap().is_none());

        let input = doc.query_selector(doc.root(), "input").unwrap().unwrap();
        assert_eq!(doc.matches(input, ":focus"), Ok(false));
        assert!(doc.focus(input));
        assert_eq!(doc.matches(input, ":focus"), Ok(true));
    }

    #[test]
    fn test_shadow_tree_elements_stop_at_root() {
        let mut doc = Document::parse("<html><body><div class=\"host\"></div></body></html>");
        let host = doc.query_selector(doc.root(), ".host").unwrap().unwrap();
        let shadow = doc.attach_shadow(host, crate::ShadowRootMode::Open).unwrap();
        doc.set_inner_html(shadow, "<p><b>in</b></p>").unwrap();
        let b = doc.query_selector(shadow, "p > b").unwrap().unwrap();

        assert_eq!(doc.matches(b, "p b"), Ok(true));
        assert_eq!(doc.matches(b, ".host b"), Ok(false));
        assert_eq!(doc.closest(b, "div"), Ok(None));
    }
}
