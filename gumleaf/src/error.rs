//! Errors raised by element and tree operations.
//!
//! Every error is reported synchronously to the caller. Validation runs before
//! any structural change, so a returned error never leaves a half-applied edit.

use facet::Facet;

/// Errors that can occur while mutating or querying the tree.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum DomError {
    /// `{name}` is not a valid attribute or element name
    InvalidName { name: String },

    /// `{value}` contains a character that is not allowed here
    InvalidCharacter { value: String },

    /// the tree cannot be modified this way
    NoModificationAllowed,

    /// the node is in the wrong state for this operation
    InvalidState,

    /// operation not supported on `{name}`
    NotSupported { name: String },

    /// `{text}` is not a valid selector or keyword
    Syntax { text: String },

    /// the element has no parent
    NoParent,

    /// the operation would yield an incorrect node tree
    HierarchyRequest,

    /// the reference node is not a child of the parent
    NotFound,

    /// `{name}` is not allowed in namespace `{namespace}`
    Namespace { name: String, namespace: String },
}

impl DomError {
    /// The DOMException name this error corresponds to.
    pub fn name(&self) -> &'static str {
        match self {
            DomError::InvalidName { .. } => "InvalidNameError",
            DomError::InvalidCharacter { .. } => "InvalidCharacterError",
            DomError::NoModificationAllowed => "NoModificationAllowedError",
            DomError::InvalidState => "InvalidStateError",
            DomError::NotSupported { .. } => "NotSupportedError",
            DomError::Syntax { .. } => "SyntaxError",
            DomError::NoParent => "NoParentError",
            DomError::HierarchyRequest => "HierarchyRequestError",
            DomError::NotFound => "NotFoundError",
            DomError::Namespace { .. } => "NamespaceError",
        }
    }

    /// Legacy DOMException code, 0 for kinds that never had one.
    pub fn code(&self) -> u16 {
        match self {
            DomError::HierarchyRequest => 3,
            DomError::InvalidCharacter { .. } => 5,
            DomError::NoModificationAllowed => 7,
            DomError::NotFound => 8,
            DomError::NotSupported { .. } => 9,
            DomError::InvalidState => 11,
            DomError::Syntax { .. } => 12,
            DomError::Namespace { .. } => 14,
            DomError::InvalidName { .. } | DomError::NoParent => 0,
        }
    }

    pub(crate) fn syntax(text: &str) -> Self {
        DomError::Syntax {
            text: text.to_string(),
        }
    }

    pub(crate) fn not_supported(name: &str) -> Self {
        DomError::NotSupported {
            name: name.to_string(),
        }
    }
}
