//! Element operations: attribute access and the notifying write path,
//! the class list, equality, and cloning.

use crate::attributes::Attr;
use crate::document::Document;
use crate::error::DomError;
use crate::mutation::{MutationRecord, NotifyTier};
use crate::name::is_valid_name;
use crate::node::{ElementData, NodeData};
use crate::token_list::{ClassList, TokenList};
use crate::trace;
use html5ever::{LocalName, Namespace, QualName};
use indextree::NodeId;
use std::borrow::Cow;
use tendril::StrTendril;

/// An attribute write, resolved to a slot in the element's container.
enum AttrChange {
    /// Replace the value at an existing position
    Replace { index: usize, value: StrTendril },
    /// Append a new entry
    Append(Attr),
    /// Remove the entry at a position
    Remove { index: usize },
}

impl Document {
    pub(crate) fn element(&self, node: NodeId) -> Option<&ElementData> {
        self.get(node).as_element()
    }

    pub(crate) fn element_or_err(&self, node: NodeId) -> Result<&ElementData, DomError> {
        self.element(node)
            .ok_or_else(|| DomError::not_supported(&self.get(node).node_name()))
    }

    /// HTML elements match unqualified attribute names ASCII-case-insensitively.
    fn fold_name<'n>(elem: &ElementData, name: &'n str) -> Cow<'n, str> {
        if elem.is_html() && name.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(name.to_ascii_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }

    pub fn local_name(&self, element: NodeId) -> Option<&str> {
        self.element(element).map(ElementData::local_name)
    }

    /// Qualified name, uppercased for HTML elements.
    pub fn tag_name(&self, element: NodeId) -> Option<String> {
        self.element(element).map(ElementData::tag_name)
    }

    pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        let elem = self.element(element)?;
        elem.attrs.get(&Self::fold_name(elem, name))
    }

    pub fn get_attribute_ns(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Option<&str> {
        self.element(element)?.attrs.get_ns(namespace, local_name)
    }

    pub fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.element(element)
            .is_some_and(|elem| elem.attrs.contains(&Self::fold_name(elem, name)))
    }

    pub fn has_attribute_ns(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> bool {
        self.element(element)
            .is_some_and(|elem| elem.attrs.contains_ns(namespace, local_name))
    }

    /// Qualified attribute names in insertion order.
    pub fn attribute_names(&self, element: NodeId) -> Vec<String> {
        self.element(element)
            .map(|elem| {
                elem.attrs
                    .iter()
                    .map(|attr| attr.qualified_name().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value of `id`, empty when absent.
    pub fn id(&self, element: NodeId) -> &str {
        self.get_attribute_ns(element, None, "id").unwrap_or_default()
    }

    /// Value of `class`, empty when absent.
    pub fn class_name(&self, element: NodeId) -> &str {
        self.get_attribute_ns(element, None, "class")
            .unwrap_or_default()
    }

    /// Set an attribute by qualified name.
    ///
    /// The name must match the XML `Name` production. HTML elements store it
    /// lowercased. An existing entry with that qualified name keeps its
    /// position; otherwise a null-namespace entry is appended.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let elem = self.element_or_err(element)?;
        if !is_valid_name(name) {
            return Err(DomError::InvalidName {
                name: name.to_string(),
            });
        }
        let name = Self::fold_name(elem, name);
        let change = match elem.attrs.position(&name) {
            Some(index) => AttrChange::Replace {
                index,
                value: StrTendril::from(value),
            },
            None => AttrChange::Append(Attr::new(&name, value)),
        };
        self.write_attribute(element, change, NotifyTier::Full);
        Ok(())
    }

    /// `Some` sets, `None` removes.
    pub fn set_or_remove_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        match value {
            Some(value) => self.set_attribute(element, name, value),
            None => {
                self.element_or_err(element)?;
                self.remove_attribute(element, name);
                Ok(())
            }
        }
    }

    /// Set an attribute by `(namespace, qualified name)`.
    ///
    /// The prefix comes from the qualified name when it has one, otherwise
    /// from whatever prefix is bound to `namespace` in scope. The name is not
    /// validated.
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.element_or_err(element)?;
        let namespace = namespace.filter(|ns| !ns.is_empty());
        let (prefix, local) = self.split_qualified_name(element, qualified_name, namespace);
        let elem = self.element_or_err(element)?;
        let change = match elem.attrs.position_ns(namespace, local) {
            Some(index) => AttrChange::Replace {
                index,
                value: StrTendril::from(value),
            },
            None => AttrChange::Append(Attr::with_namespace(
                prefix.as_deref(),
                namespace.unwrap_or_default(),
                local,
                value,
            )),
        };
        self.write_attribute(element, change, NotifyTier::Full);
        Ok(())
    }

    /// Remove by qualified name. Returns whether an entry was removed.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> bool {
        let Some(elem) = self.element(element) else {
            return false;
        };
        let Some(index) = elem.attrs.position(&Self::fold_name(elem, name)) else {
            return false;
        };
        self.write_attribute(element, AttrChange::Remove { index }, NotifyTier::Full);
        true
    }

    pub fn remove_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> bool {
        let Some(index) = self
            .element(element)
            .and_then(|elem| elem.attrs.position_ns(namespace, local_name))
        else {
            return false;
        };
        self.write_attribute(element, AttrChange::Remove { index }, NotifyTier::Full);
        true
    }

    /// Add or remove a boolean attribute. Returns whether it is present after.
    pub fn toggle_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        force: Option<bool>,
    ) -> Result<bool, DomError> {
        let elem = self.element_or_err(element)?;
        if !is_valid_name(name) {
            return Err(DomError::InvalidName {
                name: name.to_string(),
            });
        }
        let name = Self::fold_name(elem, name);
        match (elem.attrs.position(&name), force) {
            (Some(_), Some(true)) => Ok(true),
            (Some(index), _) => {
                self.write_attribute(element, AttrChange::Remove { index }, NotifyTier::Full);
                Ok(false)
            }
            (None, Some(false)) => Ok(false),
            (None, _) => {
                let attr = Attr::new(&name, "");
                self.write_attribute(element, AttrChange::Append(attr), NotifyTier::Full);
                Ok(true)
            }
        }
    }

    /// The one attribute write path. `tier` decides who hears about it.
    fn write_attribute(&mut self, element: NodeId, change: AttrChange, tier: NotifyTier) {
        let Some(elem) = self.get_mut(element).as_element_mut() else {
            return;
        };
        let (name, old, new) = match change {
            AttrChange::Replace { index, value } => {
                let name = elem.attrs.item(index).map(|a| a.name.clone());
                let old = elem.attrs.replace_value(index, value.clone());
                (name, Some(old), Some(value))
            }
            AttrChange::Append(attr) => {
                let name = attr.name.clone();
                let value = attr.value.clone();
                elem.attrs.push_fast(attr);
                (Some(name), None, Some(value))
            }
            AttrChange::Remove { index } => {
                let removed = elem.attrs.remove_at(index);
                (Some(removed.name), Some(removed.value), None)
            }
        };
        let Some(name) = name else {
            return;
        };
        trace!(
            "attribute {:?} on {:?}: {:?} -> {:?} ({:?})",
            &*name.local, element, old, new, tier
        );

        if tier == NotifyTier::Silent {
            return;
        }
        let namespace: &str = &name.ns;
        let namespace = (!namespace.is_empty()).then_some(namespace);
        self.queue_mutation(MutationRecord::attributes(
            element,
            &name.local,
            namespace,
            old.as_deref(),
        ));
        if tier == NotifyTier::Suppressed || namespace.is_some() {
            return;
        }

        if &*name.local == "class"
            && let Some(elem) = self.get_mut(element).as_element_mut()
            && let Some(list) = elem.class_list.as_mut()
        {
            *list = TokenList::parse(new.as_deref().unwrap_or_default());
        }
        for observer in self.observers.iter_mut() {
            observer.attribute_changed(element, &name.local, new.as_deref());
        }
    }

    /// Notify observers once per attribute of a freshly populated element,
    /// as if each had just been set. Namespaced attributes are included.
    pub(crate) fn run_setup_hook(&mut self, element: NodeId) {
        if self.observers.is_empty() {
            return;
        }
        let Some(elem) = self.element(element) else {
            return;
        };
        let attrs: Vec<(LocalName, StrTendril)> = elem
            .attrs
            .iter()
            .map(|attr| (attr.name.local.clone(), attr.value.clone()))
            .collect();
        for (local, value) in &attrs {
            for observer in self.observers.iter_mut() {
                observer.attribute_changed(element, local, Some(&**value));
            }
        }
    }

    /// Live token view over the `class` attribute.
    pub fn class_list(&mut self, element: NodeId) -> Result<ClassList<'_>, DomError> {
        self.element_or_err(element)?;
        if let Some(elem) = self.get_mut(element).as_element_mut()
            && elem.class_list.is_none()
        {
            let list = TokenList::parse(elem.attrs.get_ns(None, "class").unwrap_or_default());
            elem.class_list = Some(list);
        }
        Ok(ClassList::new(self, element))
    }

    pub(crate) fn class_tokens(&self, element: NodeId) -> Option<&TokenList> {
        self.element(element)?.class_list.as_ref()
    }

    pub(crate) fn class_tokens_mut(&mut self, element: NodeId) -> Option<&mut TokenList> {
        self.get_mut(element).as_element_mut()?.class_list.as_mut()
    }

    /// Write the token set back to `class` without re-parsing it.
    pub(crate) fn write_back_class(&mut self, element: NodeId) {
        let Some(elem) = self.element(element) else {
            return;
        };
        let Some(list) = elem.class_list.as_ref() else {
            return;
        };
        let position = elem.attrs.position_ns(None, "class");
        if position.is_none() && list.is_empty() {
            return;
        }
        let value = StrTendril::from(list.serialize());
        let change = match position {
            Some(index) => AttrChange::Replace { index, value },
            None => AttrChange::Append(Attr {
                name: QualName::new(None, Namespace::from(""), LocalName::from("class")),
                value,
            }),
        };
        self.write_attribute(element, change, NotifyTier::Suppressed);
    }

    /// Structural equality: kind, names, attribute sets, and children.
    pub fn is_equal_node(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes_equal(self, a, b)
    }

    /// Equality across documents.
    pub fn is_equal_node_in(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        self.nodes_equal(other, a, b)
    }

    fn nodes_equal(&self, other: &Document, a: NodeId, b: NodeId) -> bool {
        let same_data = match (self.get(a), other.get(b)) {
            (NodeData::Element(x), NodeData::Element(y)) => {
                x.name.ns == y.name.ns
                    && x.name.prefix == y.name.prefix
                    && x.name.local == y.name.local
                    && x.attrs.set_eq(&y.attrs)
            }
            (NodeData::Text(x), NodeData::Text(y)) | (NodeData::Comment(x), NodeData::Comment(y)) => {
                x == y
            }
            (
                NodeData::Doctype {
                    name: n1,
                    public_id: p1,
                    system_id: s1,
                },
                NodeData::Doctype {
                    name: n2,
                    public_id: p2,
                    system_id: s2,
                },
            ) => n1 == n2 && p1 == p2 && s1 == s2,
            (
                NodeData::ProcessingInstruction { target: t1, data: d1 },
                NodeData::ProcessingInstruction { target: t2, data: d2 },
            ) => t1 == t2 && d1 == d2,
            (NodeData::ShadowRoot(x), NodeData::ShadowRoot(y)) => x.mode == y.mode,
            (NodeData::Document, NodeData::Document)
            | (NodeData::DocumentFragment, NodeData::DocumentFragment) => true,
            _ => false,
        };
        if !same_data {
            return false;
        }
        let mut left = a.children(&self.arena);
        let mut right = b.children(&other.arena);
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if self.nodes_equal(other, x, y) => {}
                _ => return false,
            }
        }
    }

    /// Copy `node` (and its descendants when `deep`) within this document.
    ///
    /// Attributes are copied without notification; once an element's
    /// attributes and children are in place, observers see each of its
    /// attributes exactly once. No mutation records are queued.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let snapshot = Snapshot::take(self, node, deep)?;
        Ok(self.materialize(snapshot))
    }

    /// Copy a node from another document into this one.
    pub fn import_node(
        &mut self,
        source: &Document,
        node: NodeId,
        deep: bool,
    ) -> Result<NodeId, DomError> {
        let snapshot = Snapshot::take(source, node, deep)?;
        Ok(self.materialize(snapshot))
    }

    fn materialize(&mut self, snapshot: Snapshot) -> NodeId {
        let Snapshot {
            data,
            attrs,
            children,
        } = snapshot;
        let id = self.new_node(data);
        for attr in attrs {
            self.write_attribute(id, AttrChange::Append(attr), NotifyTier::Silent);
        }
        for child in children {
            let child = self.materialize(child);
            self.append_silent(id, child);
        }
        self.run_setup_hook(id);
        id
    }
}

/// Owned copy of a subtree, so cloning never borrows the arena it writes to.
struct Snapshot {
    data: NodeData,
    attrs: Vec<Attr>,
    children: Vec<Snapshot>,
}

impl Snapshot {
    fn take(doc: &Document, node: NodeId, deep: bool) -> Result<Self, DomError> {
        let data = doc.get(node);
        if matches!(data, NodeData::Document | NodeData::ShadowRoot(_)) {
            return Err(DomError::not_supported(&data.node_name()));
        }
        let attrs: Vec<Attr> = data
            .as_element()
            .map(|elem| elem.attrs.iter().cloned().collect())
            .unwrap_or_default();
        let children = if deep {
            node.children(&doc.arena)
                .map(|child| Snapshot::take(doc, child, true))
                .collect::<Result<Vec<_>, DomError>>()?
        } else {
            Vec::new()
        };
        Ok(Snapshot {
            data: data.clone_for_copy(),
            attrs,
            children,
        })
    }
}
