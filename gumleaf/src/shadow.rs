//! Shadow root attachment.
//!
//! A shadow root is an arena node whose only link to its host is the
//! document's side table (and the host id it carries). It is never a child of
//! the host, so ordinary traversal and serialization do not enter it.

use crate::debug;
use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeData, ShadowRootData, ShadowRootMode};
use indextree::NodeId;

/// Local names that cannot host a shadow root: void elements and elements
/// with their own replaced or special content model.
const DISALLOWED_HOSTS: &[&str] = &[
    "area", "audio", "base", "br", "canvas", "col", "embed", "frame", "frameset", "hr", "iframe",
    "img", "input", "link", "meta", "noscript", "object", "optgroup", "option", "param",
    "picture", "script", "select", "source", "style", "template", "textarea", "track", "video",
    "wbr",
];

impl Document {
    /// Attach a shadow root to `host`. Succeeds at most once per element.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        let Some(elem) = self.element(host) else {
            return Err(DomError::not_supported(&self.get(host).node_name()));
        };
        if DISALLOWED_HOSTS.contains(&elem.local_name()) {
            return Err(DomError::not_supported(elem.local_name()));
        }
        if self.shadow_roots.contains_key(&host) {
            return Err(DomError::InvalidState);
        }

        let root = self.new_node(NodeData::ShadowRoot(ShadowRootData { mode, host }));
        self.shadow_roots.insert(host, root);
        debug!("attached {} shadow root {:?} to {:?}", mode, root, host);
        Ok(root)
    }

    /// The attached shadow root, whatever its mode.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow_roots.get(&host).copied()
    }

    pub fn shadow_root_mode(&self, host: NodeId) -> Option<ShadowRootMode> {
        match self.get(self.shadow_root(host)?) {
            NodeData::ShadowRoot(data) => Some(data.mode),
            _ => None,
        }
    }

    /// Host element of a shadow root.
    pub fn shadow_host(&self, shadow_root: NodeId) -> Option<NodeId> {
        match self.get(shadow_root) {
            NodeData::ShadowRoot(data) => Some(data.host),
            _ => None,
        }
    }
}
