//! Node type definitions.
//!
//! `NodeKind` carries the payload of each node in the XPath data model.
//! Navigation links live in `NodeData`.

use super::NodeId;

/// The kind of an XML node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node, e.g., `<book lang="en">`.
    Element {
        /// The local part of the element name.
        name: String,
        /// Namespace prefix (e.g., `"atom"` in `atom:feed`), if any.
        prefix: Option<String>,
        /// Namespace URI bound by an in-scope `xmlns` declaration, if any.
        namespace: Option<String>,
        /// Attribute nodes owned by this element, in source order.
        attributes: Vec<NodeId>,
    },

    /// An attribute node. Its parent is the owning element, but it does not
    /// appear in that element's child list.
    Attribute {
        /// The local part of the attribute name.
        name: String,
        /// Namespace prefix (e.g., `"xml"` in `xml:lang`), if any.
        prefix: Option<String>,
        /// The normalized attribute value (references expanded).
        value: String,
    },

    /// Character data.
    Text {
        /// The decoded text content.
        content: String,
    },

    /// A CDATA section. Treated as text by `XPath`.
    CData {
        /// The section content, unescaped.
        content: String,
    },

    /// A comment, without the `<!--` and `-->` delimiters.
    Comment {
        /// The comment text.
        content: String,
    },

    /// A processing instruction, e.g., `<?xml-stylesheet href="a.xsl"?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },
}

impl NodeKind {
    /// Returns `true` for text and CDATA nodes.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. } | Self::CData { .. })
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns `true` for attribute nodes.
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute { .. })
    }
}
