//! Generic tree mutation: the single place nodes are attached and detached.
//!
//! Every insertion detaches the node from its old parent first, so the tree
//! stays acyclic and single-parented. Public edits queue child-list records;
//! the `*_silent` variants are for parsing and cloning.

use crate::debug;
use crate::document::Document;
use crate::error::DomError;
use crate::mutation::MutationRecord;
use crate::node::NodeData;
use indextree::NodeId;

impl Document {
    /// Parent node, if any. Shadow roots have no parent.
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.arena[node].parent()
    }

    /// All child nodes, in order.
    pub fn child_nodes(&self, node: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        node.children(&self.arena)
    }

    /// Position of `node` among its parent's children.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent_node(node)?;
        parent.children(&self.arena).position(|id| id == node)
    }

    /// Ancestors that cross shadow boundaries (shadow root -> host).
    fn host_including_inclusive_ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            out.push(id);
            current = match self.get(id) {
                NodeData::ShadowRoot(data) => Some(data.host),
                _ => self.parent_node(id),
            };
        }
        out
    }

    /// The root reached by walking parents and crossing shadow boundaries.
    pub(crate) fn shadow_including_root(&self, node: NodeId) -> NodeId {
        self.host_including_inclusive_ancestors(node)
            .last()
            .copied()
            .unwrap_or(node)
    }

    /// Whether the node is in the document (possibly inside a shadow tree).
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.shadow_including_root(node) == self.root
    }

    fn ensure_pre_insertion_validity(
        &self,
        parent: NodeId,
        node: NodeId,
        child: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.get(parent).is_container() && !self.get(parent).is_element() {
            return Err(DomError::HierarchyRequest);
        }
        if self.host_including_inclusive_ancestors(parent).contains(&node) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(child) = child
            && self.parent_node(child) != Some(parent)
        {
            return Err(DomError::NotFound);
        }

        let parent_is_document = matches!(self.get(parent), NodeData::Document);
        match self.get(node) {
            NodeData::Document | NodeData::ShadowRoot(_) => Err(DomError::HierarchyRequest),
            NodeData::Doctype { .. } if !parent_is_document => Err(DomError::HierarchyRequest),
            NodeData::Text(_) if parent_is_document => Err(DomError::HierarchyRequest),
            _ if !parent_is_document => Ok(()),
            NodeData::DocumentFragment => {
                let elements = node
                    .children(&self.arena)
                    .filter(|&id| self.get(id).is_element())
                    .count();
                let has_text = node.children(&self.arena).any(|id| self.get(id).is_text());
                if has_text || elements > 1 || (elements == 1 && self.has_element_child(parent, node)) {
                    return Err(DomError::HierarchyRequest);
                }
                Ok(())
            }
            NodeData::Element(_) if self.has_element_child(parent, node) => {
                Err(DomError::HierarchyRequest)
            }
            NodeData::Doctype { .. }
                if parent
                    .children(&self.arena)
                    .any(|id| id != node && matches!(self.get(id), NodeData::Doctype { .. })) =>
            {
                Err(DomError::HierarchyRequest)
            }
            _ => Ok(()),
        }
    }

    /// Whether `parent` has an element child other than `ignoring`.
    fn has_element_child(&self, parent: NodeId, ignoring: NodeId) -> bool {
        parent
            .children(&self.arena)
            .any(|id| id != ignoring && self.get(id).is_element())
    }

    /// Insert `node` before `child` (or append when `None`). A fragment
    /// inserts its children instead of itself.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.ensure_pre_insertion_validity(parent, node, child)?;
        let reference = match child {
            Some(child) if child == node => self.arena[node].next_sibling(),
            other => other,
        };
        debug!(
            "insert_before: parent={:?} node={:?} reference={:?}",
            parent, node, reference
        );
        let nodes = self.take_insertable(node);
        self.attach(parent, &nodes, reference)?;
        self.queue_child_list(parent, nodes, Vec::new(), reference);
        Ok(node)
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        self.insert_before(parent, node, None)
    }

    pub fn prepend_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        let first = self.arena[parent].first_child();
        self.insert_before(parent, node, first)
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.parent_node(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.remove(child);
        Ok(child)
    }

    /// Replace `child` of `parent` with `node`. Returns `child`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        node: NodeId,
        child: NodeId,
    ) -> Result<NodeId, DomError> {
        if self.parent_node(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        if child != node {
            // `child` is about to leave, so it does not count against the
            // document's single-element rule.
            self.ensure_replace_validity(parent, node, child)?;
        }
        debug!("replace_child: parent={:?} old={:?} new={:?}", parent, child, node);

        let mut reference = self.arena[child].next_sibling();
        if reference == Some(node) {
            reference = self.arena[node].next_sibling();
        }
        let previous = self.arena[child].previous_sibling();

        let mut removed = Vec::new();
        if child != node {
            self.detach_with_cleanup(child);
            removed.push(child);
        }
        let nodes = self.take_insertable(node);
        self.attach(parent, &nodes, reference)?;

        if !nodes.is_empty() || !removed.is_empty() {
            self.queue_mutation(MutationRecord::child_list(
                parent, nodes, removed, previous, reference,
            ));
        }
        Ok(child)
    }

    fn ensure_replace_validity(
        &self,
        parent: NodeId,
        node: NodeId,
        child: NodeId,
    ) -> Result<(), DomError> {
        if !matches!(self.get(parent), NodeData::Document) {
            return self.ensure_pre_insertion_validity(parent, node, Some(child));
        }
        if self.host_including_inclusive_ancestors(parent).contains(&node) {
            return Err(DomError::HierarchyRequest);
        }
        let element_elsewhere = parent
            .children(&self.arena)
            .any(|id| id != child && id != node && self.get(id).is_element());
        match self.get(node) {
            NodeData::Document | NodeData::ShadowRoot(_) | NodeData::Text(_) => {
                Err(DomError::HierarchyRequest)
            }
            NodeData::Element(_) if element_elsewhere => Err(DomError::HierarchyRequest),
            NodeData::DocumentFragment => {
                let elements = node
                    .children(&self.arena)
                    .filter(|&id| self.get(id).is_element())
                    .count();
                let has_text = node.children(&self.arena).any(|id| self.get(id).is_text());
                if has_text || elements > 1 || (elements == 1 && element_elsewhere) {
                    return Err(DomError::HierarchyRequest);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Detach `node` from its parent, queueing a child-list record.
    /// A parentless node is left alone.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.parent_node(node) else {
            return;
        };
        let previous = self.arena[node].previous_sibling();
        let next = self.arena[node].next_sibling();
        debug!("remove: {:?} from {:?}", node, parent);
        self.detach_with_cleanup(node);
        self.queue_mutation(MutationRecord::child_list(
            parent,
            Vec::new(),
            vec![node],
            previous,
            next,
        ));
    }

    /// Replace all children of `parent` with `node` (or with nothing), as one
    /// child-list record.
    pub(crate) fn replace_all(
        &mut self,
        parent: NodeId,
        node: Option<NodeId>,
    ) -> Result<(), DomError> {
        if let Some(node) = node {
            self.ensure_pre_insertion_validity(parent, node, None)?;
        }
        let removed: Vec<NodeId> = parent.children(&self.arena).collect();
        for &child in &removed {
            self.detach_with_cleanup(child);
        }
        let added = match node {
            Some(node) => {
                let nodes = self.take_insertable(node);
                self.attach(parent, &nodes, None)?;
                nodes
            }
            None => Vec::new(),
        };
        if !added.is_empty() || !removed.is_empty() {
            self.queue_mutation(MutationRecord::child_list(
                parent,
                added,
                removed,
                None,
                None,
            ));
        }
        Ok(())
    }

    /// Append without checks or records. Only for building trees that nothing
    /// has observed yet.
    pub(crate) fn append_silent(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// The nodes `node` stands for when inserted, detached and ready.
    ///
    /// A fragment gives up its children (with a record on the fragment); any
    /// other node is removed from its current parent.
    fn take_insertable(&mut self, node: NodeId) -> Vec<NodeId> {
        if matches!(self.get(node), NodeData::DocumentFragment) {
            let children: Vec<NodeId> = node.children(&self.arena).collect();
            if children.is_empty() {
                return children;
            }
            for &child in &children {
                child.detach(&mut self.arena);
            }
            self.queue_mutation(MutationRecord::child_list(
                node,
                Vec::new(),
                children.clone(),
                None,
                None,
            ));
            children
        } else {
            self.remove(node);
            vec![node]
        }
    }

    fn attach(
        &mut self,
        parent: NodeId,
        nodes: &[NodeId],
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        for &node in nodes {
            match reference {
                Some(reference) => reference
                    .checked_insert_before(node, &mut self.arena)
                    .map_err(|_| DomError::HierarchyRequest)?,
                None => parent
                    .checked_append(node, &mut self.arena)
                    .map_err(|_| DomError::HierarchyRequest)?,
            }
        }
        Ok(())
    }

    fn queue_child_list(
        &mut self,
        parent: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
        reference: Option<NodeId>,
    ) {
        if added.is_empty() && removed.is_empty() {
            return;
        }
        let previous = match added.first() {
            Some(&first) => self.arena[first].previous_sibling(),
            None => None,
        };
        self.queue_mutation(MutationRecord::child_list(
            parent, added, removed, previous, reference,
        ));
    }

    /// Detach and drop focus if the focused element was inside.
    fn detach_with_cleanup(&mut self, node: NodeId) {
        if let Some(focused) = self.focused
            && self
                .host_including_inclusive_ancestors(focused)
                .contains(&node)
        {
            debug!("focused element {:?} left the tree", focused);
            self.focused = None;
        }
        node.detach(&mut self.arena);
    }
}
