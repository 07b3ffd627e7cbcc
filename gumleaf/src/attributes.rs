//! Namespace-aware attribute storage.
//!
//! An [`Attributes`] container is owned by exactly one element and only ever
//! reached through it. Entries keep first-insertion order, and no two entries
//! share a `(namespace, local name)` pair. Notification is not handled here:
//! the document write path decides who hears about a change.

use html5ever::{LocalName, Namespace, Prefix, QualName};
use smallvec::SmallVec;
use std::borrow::Cow;
use tendril::StrTendril;

/// One attribute: prefix, local name, namespace, and value.
///
/// Entries are replaced rather than edited in place, except for their value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Prefix, namespace (empty atom for null), and local name
    pub name: QualName,
    /// Attribute value (refcounted, cheap to clone)
    pub value: StrTendril,
}

impl Attr {
    /// Create a null-namespace attribute.
    pub fn new(local: &str, value: &str) -> Self {
        Self {
            name: QualName::new(None, Namespace::from(""), LocalName::from(local)),
            value: StrTendril::from(value),
        }
    }

    /// Create a namespaced attribute.
    pub fn with_namespace(prefix: Option<&str>, namespace: &str, local: &str, value: &str) -> Self {
        Self {
            name: QualName::new(
                prefix.map(Prefix::from),
                Namespace::from(namespace),
                LocalName::from(local),
            ),
            value: StrTendril::from(value),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.prefix.as_deref()
    }

    /// Namespace URI, `None` for the null namespace.
    pub fn namespace(&self) -> Option<&str> {
        let ns: &str = &self.name.ns;
        (!ns.is_empty()).then_some(ns)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// `prefix:local` when prefixed, otherwise the local name.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.prefix() {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.local_name())),
            None => Cow::Borrowed(self.local_name()),
        }
    }

    /// Compare against a qualified name without allocating.
    fn has_qualified_name(&self, name: &str) -> bool {
        let local = self.local_name();
        match self.prefix() {
            None => local == name,
            Some(prefix) => {
                name.len() == prefix.len() + 1 + local.len()
                    && name.starts_with(prefix)
                    && name[prefix.len()..].starts_with(':')
                    && name.ends_with(local)
            }
        }
    }

    fn has_identity(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace() == namespace.filter(|ns| !ns.is_empty()) && self.local_name() == local
    }
}

/// Ordered collection of an element's attributes.
///
/// Most elements carry only a handful of attributes, so they are stored inline.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: SmallVec<[Attr; 4]>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.entries.iter()
    }

    /// Attribute at `index` in insertion order.
    pub fn item(&self, index: usize) -> Option<&Attr> {
        self.entries.get(index)
    }

    /// Position of the first entry whose qualified name is `name`.
    ///
    /// Case folding is the caller's business: the element knows whether it is
    /// in the HTML namespace.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|a| a.has_qualified_name(name))
    }

    /// Position of the entry with this `(namespace, local)` identity.
    pub fn position_ns(&self, namespace: Option<&str>, local: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|a| a.has_identity(namespace, local))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].value())
    }

    pub fn get_ns(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.position_ns(namespace, local)
            .map(|i| self.entries[i].value())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn contains_ns(&self, namespace: Option<&str>, local: &str) -> bool {
        self.position_ns(namespace, local).is_some()
    }

    /// Append without any check or notification.
    ///
    /// Only for populating elements that observers have not seen yet (parsing
    /// and cloning). Callers guarantee the identity is not already present.
    pub fn push_fast(&mut self, attr: Attr) {
        self.entries.push(attr);
    }

    /// Append `attr` unless its `(namespace, local)` identity is already taken.
    /// Returns whether it was added.
    pub fn push_if_missing(&mut self, attr: Attr) -> bool {
        if self.contains_ns(attr.namespace(), attr.local_name()) {
            return false;
        }
        self.entries.push(attr);
        true
    }

    /// Swap in a new value at `index`, returning the old one.
    pub(crate) fn replace_value(&mut self, index: usize, value: StrTendril) -> StrTendril {
        std::mem::replace(&mut self.entries[index].value, value)
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Attr {
        self.entries.remove(index)
    }

    /// Order-independent equality: same identities with the same values.
    pub fn set_eq(&self, other: &Attributes) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|a| {
                other.get_ns(a.namespace(), a.local_name()) == Some(a.value())
            })
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
