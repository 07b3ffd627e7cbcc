//! Mutation records and attribute observers.

use indextree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// One queued description of a change, in the shape DOM mutation observers see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub attribute_namespace: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    fn empty(mutation_type: MutationType, target: NodeId) -> Self {
        Self {
            mutation_type,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            attribute_namespace: None,
            old_value: None,
        }
    }

    pub(crate) fn attributes(
        target: NodeId,
        local_name: &str,
        namespace: Option<&str>,
        old_value: Option<&str>,
    ) -> Self {
        Self {
            attribute_name: Some(local_name.to_string()),
            attribute_namespace: namespace.map(str::to_string),
            old_value: old_value.map(str::to_string),
            ..Self::empty(MutationType::Attributes, target)
        }
    }

    pub(crate) fn character_data(target: NodeId, old_value: &str) -> Self {
        Self {
            old_value: Some(old_value.to_string()),
            ..Self::empty(MutationType::CharacterData, target)
        }
    }

    pub(crate) fn child_list(
        target: NodeId,
        added_nodes: Vec<NodeId>,
        removed_nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            added_nodes,
            removed_nodes,
            previous_sibling,
            next_sibling,
            ..Self::empty(MutationType::ChildList, target)
        }
    }
}

/// Who hears about an attribute write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTier {
    /// Observers, a mutation record, and class-list resync. Observers only
    /// hear about null-namespace attributes on this tier.
    Full,
    /// A mutation record only. Used when a derived view writes back to its
    /// source attribute.
    Suppressed,
    /// Nothing at all. Cloning populates elements this way before the setup
    /// hook reports every attribute.
    Silent,
}

/// Receives attribute changes on live elements.
///
/// Observers run synchronously, in registration order, before the write
/// returns. Live writes report null-namespace attributes only; the setup hook
/// run for cloned and fragment-parsed elements reports every attribute once.
/// `value` is `None` when the attribute was removed.
pub trait AttributeObserver {
    fn attribute_changed(&mut self, element: NodeId, local_name: &str, value: Option<&str>);
}

impl<F> AttributeObserver for F
where
    F: FnMut(NodeId, &str, Option<&str>),
{
    fn attribute_changed(&mut self, element: NodeId, local_name: &str, value: Option<&str>) {
        self(element, local_name, value)
    }
}
