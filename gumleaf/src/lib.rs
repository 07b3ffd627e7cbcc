//! DOM element core on an indextree arena, with html5ever parsing.
//!
//! gumleaf provides:
//! - **Element nodes**: namespace-aware attributes, `classList`, shadow roots
//! - **Tree edits**: DOM insertion rules, adjacent insertion, inner/outer HTML
//! - **Observation**: queued mutation records and synchronous attribute observers
//! - **Queries**: a compiled selector engine for `matches`/`closest`/`query_selector`
//! - **Serialization**: HTML5-correct markup with proper escaping
//!
//! All nodes belong to a [`Document`] and are addressed by [`NodeId`].
//!
//! # Example
//!
//! ```rust
//! use gumleaf::{AdjacentPosition, Document};
//!
//! let mut doc = Document::parse("<!DOCTYPE html><html><body><ul><li>one</li></ul></body></html>");
//! let ul = doc.query_selector(doc.root(), "ul").unwrap().unwrap();
//!
//! doc.insert_adjacent_html(ul, AdjacentPosition::BeforeEnd, "<li class=new>two</li>")
//!     .unwrap();
//! doc.class_list(ul).unwrap().add(&["list"]).unwrap();
//!
//! assert_eq!(
//!     doc.outer_html(ul),
//!     r#"<ul class="list"><li>one</li><li class="new">two</li></ul>"#
//! );
//! assert_eq!(doc.query_selector_all(ul, "li.new").unwrap().len(), 1);
//! ```

mod tracing_macros;

mod attributes;
mod document;
mod edit;
mod element;
mod error;
mod mutation;
pub mod name;
pub mod namespace;
mod node;
mod parser;
mod selector;
pub mod serialize;
mod shadow;
mod token_list;
mod traverse;
mod tree;

pub use attributes::{Attr, Attributes};
pub use document::Document;
pub use edit::AdjacentPosition;
pub use error::DomError;
pub use mutation::{AttributeObserver, MutationRecord, MutationType};
pub use node::{ElementData, NodeData, ShadowRootData, ShadowRootMode};
pub use parser::ParseOptions;
pub use selector::SelectorList;
pub use serialize::{HtmlFormatter, MarkupFormatter, SerializeOptions};
pub use token_list::{ClassList, TokenList};
pub use traverse::Children;

// Node identity
pub use indextree::NodeId;

// Names are html5ever's interned atoms
pub use html5ever::{LocalName, Namespace, Prefix, QualName};
