//! End-to-end behavior of element operations through the public API.

use gumleaf::{
    AdjacentPosition, Document, DomError, MutationType, NodeId, ShadowRootMode,
    namespace::{SVG_NAMESPACE, XLINK_NAMESPACE},
};
use std::cell::RefCell;
use std::rc::Rc;

type Notifications = Rc<RefCell<Vec<(NodeId, String, Option<String>)>>>;

fn observe(doc: &mut Document) -> Notifications {
    let seen: Notifications = Rc::default();
    let sink = seen.clone();
    doc.register_observer(move |el: NodeId, name: &str, value: Option<&str>| {
        sink.borrow_mut()
            .push((el, name.to_string(), value.map(str::to_string)));
    });
    seen
}

fn body_of(html: &str) -> (Document, NodeId) {
    let doc = Document::parse(html);
    let body = doc.body().expect("should have body");
    (doc, body)
}

#[test]
fn test_set_then_get_attribute() {
    facet_testhelpers::setup();

    let mut doc = Document::new();
    let div = doc.create_element("div").unwrap();
    doc.set_attribute(div, "data-x", "1").unwrap();
    doc.set_attribute(div, "DATA-X", "2").unwrap();

    assert_eq!(doc.get_attribute(div, "data-x"), Some("2"));
    assert_eq!(doc.attribute_names(div), vec!["data-x"]);
    assert!(doc.remove_attribute(div, "data-x"));
    assert_eq!(doc.get_attribute(div, "data-x"), None);
    assert!(!doc.remove_attribute(div, "data-x"));
}

#[test]
fn test_attribute_identity_is_namespace_and_local_name() {
    facet_testhelpers::setup();

    let mut doc = Document::new();
    let svg = doc.create_element_ns(Some(SVG_NAMESPACE), "svg").unwrap();
    doc.set_attribute_ns(svg, Some(XLINK_NAMESPACE), "xlink:href", "#a")
        .unwrap();
    doc.set_attribute_ns(svg, Some(XLINK_NAMESPACE), "other:href", "#b")
        .unwrap();
    doc.set_attribute(svg, "href", "plain").unwrap();

    // One entry per (namespace, local name); the first prefix sticks.
    assert_eq!(
        doc.get_attribute_ns(svg, Some(XLINK_NAMESPACE), "href"),
        Some("#b")
    );
    assert_eq!(doc.get_attribute(svg, "xlink:href"), Some("#b"));
    assert_eq!(doc.get_attribute(svg, "href"), Some("plain"));
    assert_eq!(doc.attribute_names(svg), vec!["xlink:href", "href"]);
}

#[test]
fn test_outer_html_round_trip() {
    facet_testhelpers::setup();

    let (mut doc, body) = body_of(
        r#"<html><body><main><section id="s" class="a b"><h1>Title &amp; more</h1><p>one<br>two</p><pre>
x</pre></section><footer></footer></main></body></html>"#,
    );
    let main = doc.first_element_child(body).unwrap();
    let section = doc.first_element_child(main).unwrap();
    let original = doc.clone_node(section, true).unwrap();

    let markup = doc.outer_html(section);
    doc.set_outer_html(section, &markup).unwrap();

    let replacement = doc.first_element_child(main).unwrap();
    assert_ne!(replacement, section);
    assert_eq!(doc.parent_node(section), None);
    assert!(doc.is_equal_node(replacement, original));
    assert_eq!(doc.outer_html(replacement), markup);
}

#[test]
fn test_sibling_navigation_boundaries() {
    facet_testhelpers::setup();

    let mut doc = Document::new();
    let lone = doc.create_element("p").unwrap();
    assert_eq!(doc.previous_element_sibling(lone), None);
    assert_eq!(doc.next_element_sibling(lone), None);

    let (doc, body) = body_of("<html><body>t<a></a>u<b></b>v</body></html>");
    let a = doc.first_element_child(body).unwrap();
    let b = doc.last_element_child(body).unwrap();
    assert_eq!(doc.previous_element_sibling(a), None);
    assert_eq!(doc.next_element_sibling(a), Some(b));
    assert_eq!(doc.next_element_sibling(b), None);
    assert_eq!(doc.previous_element_sibling(b), Some(a));
}

#[test]
fn test_shadow_attach_once() {
    facet_testhelpers::setup();

    let mut doc = Document::new();
    let host = doc.create_element("section").unwrap();
    let first = doc.attach_shadow(host, ShadowRootMode::Open).unwrap();

    for mode in [ShadowRootMode::Open, ShadowRootMode::Closed] {
        assert_eq!(doc.attach_shadow(host, mode), Err(DomError::InvalidState));
    }
    assert_eq!(doc.shadow_root(host), Some(first));
    assert_eq!(doc.shadow_root_mode(host), Some(ShadowRootMode::Open));
}

#[test]
fn test_clone_notifies_once_per_attribute() {
    facet_testhelpers::setup();

    let mut doc = Document::new();
    let div = doc.create_element("div").unwrap();
    for (name, value) in [("id", "x"), ("class", "a")] {
        doc.set_attribute(div, name, value).unwrap();
    }
    doc.set_attribute_ns(div, Some(XLINK_NAMESPACE), "xlink:title", "t")
        .unwrap();
    let seen = observe(&mut doc);
    doc.take_mutation_records();

    let copy = doc.clone_node(div, false).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|(el, _, _)| *el == copy));
    assert!(doc.mutation_records().is_empty());
    assert!(doc.is_equal_node(div, copy));
}

#[test]
fn test_deep_clone_notifies_across_descendants() {
    facet_testhelpers::setup();

    let (mut doc, body) = body_of(
        r#"<html><body><table id="t"><tbody><tr class="r"><td colspan="2" title="c">x</td></tr></tbody></table></body></html>"#,
    );
    let table = doc.first_element_child(body).unwrap();
    doc.take_mutation_records();
    let seen = observe(&mut doc);

    let copy = doc.clone_node(table, true).unwrap();

    let seen = seen.borrow();
    let names: Vec<&str> = seen.iter().map(|(_, name, _)| name.as_str()).collect();
    assert_eq!(names.len(), 4);
    for name in ["id", "class", "colspan", "title"] {
        assert!(names.contains(&name), "{name} not reported");
    }
    assert!(seen.iter().all(|(el, _, _)| *el != table));
    assert!(doc.mutation_records().is_empty());
    assert!(doc.is_equal_node(table, copy));
}

#[test]
fn test_adjacent_html_under_document_fails() {
    facet_testhelpers::setup();

    let mut doc = Document::parse("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>");
    let html = doc.document_element().unwrap();
    let before = doc.to_html();
    doc.take_mutation_records();

    for position in [AdjacentPosition::BeforeBegin, AdjacentPosition::AfterEnd] {
        assert_eq!(
            doc.insert_adjacent_html(html, position, "<div></div>"),
            Err(DomError::NoModificationAllowed)
        );
    }
    assert_eq!(doc.to_html(), before);
    assert!(doc.mutation_records().is_empty());
    assert_eq!(doc.child_nodes(doc.root()).count(), 2);
}

#[test]
fn test_adjacent_insertion_positions() {
    facet_testhelpers::setup();

    let fresh = || {
        let (doc, body) = body_of("<html><body><div><span></span></div></body></html>");
        let div = doc.first_element_child(body).unwrap();
        let span = doc.first_element_child(div).unwrap();
        (doc, div, span)
    };

    let (mut doc, div, _) = fresh();
    doc.insert_adjacent_html(div, AdjacentPosition::AfterBegin, "<b></b>")
        .unwrap();
    assert_eq!(doc.outer_html(div), "<div><b></b><span></span></div>");

    let (mut doc, div, _) = fresh();
    doc.insert_adjacent_html(div, AdjacentPosition::BeforeEnd, "<b></b>")
        .unwrap();
    assert_eq!(doc.outer_html(div), "<div><span></span><b></b></div>");

    let (mut doc, div, span) = fresh();
    doc.insert_adjacent_html(span, AdjacentPosition::BeforeBegin, "<b></b>")
        .unwrap();
    assert_eq!(doc.outer_html(div), "<div><b></b><span></span></div>");

    let (mut doc, div, span) = fresh();
    doc.insert_adjacent_html(span, AdjacentPosition::AfterEnd, "<b></b>")
        .unwrap();
    assert_eq!(doc.outer_html(div), "<div><span></span><b></b></div>");
}

#[test]
fn test_outer_html_under_document_fails() {
    facet_testhelpers::setup();

    let mut doc = Document::parse("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>");
    let html = doc.document_element().unwrap();
    let before = doc.to_html();
    doc.take_mutation_records();

    assert_eq!(
        doc.set_outer_html(html, "<div></div>"),
        Err(DomError::NoModificationAllowed)
    );
    assert_eq!(doc.to_html(), before);
    assert!(doc.mutation_records().is_empty());
}

#[test]
fn test_class_list_stays_in_sync() {
    facet_testhelpers::setup();

    let mut doc = Document::new();
    let el = doc.create_element("div").unwrap();
    doc.set_attribute(el, "class", "a b").unwrap();
    let seen = observe(&mut doc);
    doc.take_mutation_records();

    {
        let mut classes = doc.class_list(el).unwrap();
        assert_eq!(classes.to_vec(), ["a", "b"]);
        classes.add(&["c"]).unwrap();
        assert!(!classes.toggle("a", None).unwrap());
        assert_eq!(
            classes.add(&["has space"]),
            Err(DomError::InvalidCharacter {
                value: "has space".to_string()
            })
        );
    }
    assert_eq!(doc.class_name(el), "b c");

    // Derived writes queue records but do not notify observers
    assert!(seen.borrow().is_empty());
    let records = doc.take_mutation_records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.mutation_type == MutationType::Attributes));

    // A direct write is seen by observers and the class list
    doc.set_attribute(el, "class", "z").unwrap();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(doc.class_list(el).unwrap().to_vec(), ["z"]);
}

#[test]
fn test_closest_and_queries() {
    facet_testhelpers::setup();

    let (doc, body) = body_of(
        r#"<html><body><nav class="menu"><ul><li><a href="/x">x</a></li><li><a>y</a></li></ul></nav></body></html>"#,
    );
    let links = doc.query_selector_all(body, "nav.menu li > a").unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(doc.query_selector(body, "a[href]").unwrap(), Some(links[0]));

    let nav = doc.closest(links[1], ".menu").unwrap().unwrap();
    assert_eq!(doc.local_name(nav), Some("nav"));
    assert_eq!(doc.matches(links[0], "li:first-child a"), Ok(true));
    assert!(matches!(
        doc.query_selector(body, "a["),
        Err(DomError::Syntax { .. })
    ));
}

#[test]
fn test_text_content_round_trip() {
    facet_testhelpers::setup();

    let (mut doc, body) = body_of("<html><body><p>a<b>b<i>c</i></b>d</p></body></html>");
    let p = doc.first_element_child(body).unwrap();
    assert_eq!(doc.text_content(p).as_deref(), Some("abcd"));

    doc.set_text_content(p, Some("<plain>")).unwrap();
    assert_eq!(doc.inner_html(p), "&lt;plain&gt;");
    doc.set_text_content(p, Some("")).unwrap();
    assert_eq!(doc.child_nodes(p).count(), 0);
}

#[test]
fn test_focus_cleared_when_subtree_removed() {
    facet_testhelpers::setup();

    let (mut doc, body) = body_of("<html><body><form><input></form></body></html>");
    let form = doc.first_element_child(body).unwrap();
    let input = doc.first_element_child(form).unwrap();
    assert!(doc.focus(input));

    doc.set_inner_html(body, "<p>gone</p>").unwrap();
    assert_eq!(doc.focused_element(), None);
}
