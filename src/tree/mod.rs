//! Arena-based XML document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the `Document` and
//! are referenced by `NodeId`, a newtype over `NonZeroU32`. The parser
//! allocates nodes in document order (an element, then its attributes, then
//! its content), so comparing two `NodeId`s compares their document order.
//!
//! A `Document` is built for a single input value and dropped afterwards;
//! nothing in it is shared between rows.

mod node;

pub use node::NodeKind;

use std::num::NonZeroU32;

use crate::error::ParseError;

/// A typed index into the document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or does not fit in a `u32`.
    #[allow(clippy::expect_used)]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).expect("node arena exceeds u32::MAX entries");
        Self(NonZeroU32::new(raw).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node. For attributes this is the owning element.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// A parsed XML document.
///
/// # Examples
///
/// ```
/// use xmlselect::Document;
///
/// let doc = Document::parse_str("<books><book>Emma</book></books>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root).as_deref(), Some("books"));
/// assert_eq!(doc.text_content(root), "Emma");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is a placeholder so ids can be non-zero.
    nodes: Vec<NodeData>,
    /// The document node.
    root: NodeId,
    /// XML version from the XML declaration (e.g., "1.0").
    pub version: Option<String>,
    /// Encoding from the XML declaration (e.g., "UTF-8").
    pub encoding: Option<String>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<bool>,
}

impl Document {
    /// Creates a new empty document.
    ///
    /// The result is valid but childless: every location path evaluated
    /// against it selects nothing below the document node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(32);
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Parses an XML string into a `Document` with default options.
    ///
    /// A leading byte order mark is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the input is not well-formed XML.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        crate::parser::parse_str(input)
    }

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the single top-level element, if the document has one.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node(id).kind.is_element())
    }

    /// Returns `true` if the document node has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node(self.root).first_child.is_none()
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Returns the qualified name (`prefix:local` or `local`) of an element or
    /// attribute, or the target of a processing instruction.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Element { name, prefix, .. } | NodeKind::Attribute { name, prefix, .. } => {
                Some(match prefix {
                    Some(p) => format!("{p}:{name}"),
                    None => name.clone(),
                })
            }
            NodeKind::ProcessingInstruction { target, .. } => Some(target.clone()),
            _ => None,
        }
    }

    /// Returns the local part of an element or attribute name, or the target
    /// of a processing instruction.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. }
            | NodeKind::Attribute { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns `true` if the element or attribute `id` has exactly the
    /// qualified name `qname`.
    #[must_use]
    pub fn has_qualified_name(&self, id: NodeId, qname: &str) -> bool {
        match self.kind(id) {
            NodeKind::Element { name, prefix, .. } | NodeKind::Attribute { name, prefix, .. } => {
                qname_matches(prefix.as_deref(), name, qname)
            }
            _ => false,
        }
    }

    /// Returns the namespace prefix of an element or attribute.
    #[must_use]
    pub fn node_prefix(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { prefix, .. } | NodeKind::Attribute { prefix, .. } => {
                prefix.as_deref()
            }
            _ => None,
        }
    }

    /// Returns the namespace URI of an element node, if any.
    #[must_use]
    pub fn node_namespace(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Returns the attribute nodes of an element.
    ///
    /// Returns an empty slice for non-element nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns the value of an attribute by qualified name.
    #[must_use]
    pub fn attribute(&self, id: NodeId, qname: &str) -> Option<&str> {
        self.attributes(id).iter().find_map(|&attr| match self.kind(attr) {
            NodeKind::Attribute {
                name,
                prefix,
                value,
            } if qname_matches(prefix.as_deref(), name, qname) => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns the concatenated text of all descendant text and CDATA nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        match self.kind(id) {
            NodeKind::Text { content } | NodeKind::CData { content } => out.push_str(content),
            _ => {
                for desc in self.descendants(id) {
                    if let NodeKind::Text { content } | NodeKind::CData { content } =
                        self.kind(desc)
                    {
                        out.push_str(content);
                    }
                }
            }
        }
        out
    }

    /// Computes the `XPath` string-value of a node (`XPath` 1.0 section 5).
    #[must_use]
    pub fn string_value(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Document | NodeKind::Element { .. } => self.text_content(id),
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content } => content.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone().unwrap_or_default(),
        }
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over the ancestors of a node, nearest first.
    /// The node itself is not included.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Returns a depth-first iterator over the descendants of a node.
    /// Attribute nodes are not descendants.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // --- Construction ---

    /// Allocates a new detached node and returns its id.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Appends `child` to the end of `parent`'s child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent"
        );
        self.node_mut(child).parent = Some(parent);
        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
        } else {
            self.node_mut(parent).first_child = Some(child);
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Allocates an attribute node and attaches it to `element`.
    ///
    /// Does nothing and returns `None` if `element` is not an element.
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        prefix: Option<String>,
        name: String,
        value: String,
    ) -> Option<NodeId> {
        if !self.kind(element).is_element() {
            return None;
        }
        let attr = self.create_node(NodeKind::Attribute {
            name,
            prefix,
            value,
        });
        self.node_mut(attr).parent = Some(element);
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(element).kind {
            attributes.push(attr);
        }
        Some(attr)
    }

    /// Returns the number of allocated nodes, excluding the placeholder.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares a split name against a qualified name without allocating.
fn qname_matches(prefix: Option<&str>, local: &str, qname: &str) -> bool {
    match prefix {
        Some(p) => qname
            .strip_prefix(p)
            .and_then(|rest| rest.strip_prefix(':'))
            .is_some_and(|rest| rest == local),
        None => qname == local,
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Depth-first iterator over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        let mut node = current;
        loop {
            if node == self.root {
                self.next = None;
                break;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                self.next = Some(sibling);
                break;
            }
            match self.doc.parent(node) {
                Some(parent) => node = parent,
                None => {
                    self.next = None;
                    break;
                }
            }
        }
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn element(doc: &mut Document, name: &str) -> NodeId {
        doc.create_node(NodeKind::Element {
            name: name.to_string(),
            prefix: None,
            namespace: None,
            attributes: Vec::new(),
        })
    }

    fn text(doc: &mut Document, content: &str) -> NodeId {
        doc.create_node(NodeKind::Text {
            content: content.to_string(),
        })
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert!(matches!(doc.kind(doc.root()), NodeKind::Document));
        assert!(doc.is_empty());
        assert_eq!(doc.root_element(), None);
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_append_children_links_siblings() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = text(&mut doc, "A");
        let b = text(&mut doc, "B");
        let c = text(&mut doc, "C");
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);

        assert_eq!(doc.first_child(root), Some(a));
        assert_eq!(doc.last_child(root), Some(c));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.prev_sibling(c), Some(b));
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_descendants_stay_inside_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let books = element(&mut doc, "books");
        let first = element(&mut doc, "book");
        let first_text = text(&mut doc, "Emma");
        let second = element(&mut doc, "book");
        doc.append_child(root, books);
        doc.append_child(books, first);
        doc.append_child(first, first_text);
        doc.append_child(books, second);

        assert_eq!(doc.descendants(first).collect::<Vec<_>>(), vec![first_text]);
        assert_eq!(
            doc.descendants(root).collect::<Vec<_>>(),
            vec![books, first, first_text, second]
        );
    }

    #[test]
    fn test_ancestors_excludes_self() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, "a");
        let b = element(&mut doc, "b");
        doc.append_child(root, a);
        doc.append_child(a, b);
        assert_eq!(doc.ancestors(b).collect::<Vec<_>>(), vec![a, root]);
    }

    #[test]
    fn test_attributes_are_not_children() {
        let mut doc = Document::new();
        let root = doc.root();
        let book = element(&mut doc, "book");
        doc.append_child(root, book);
        let attr = doc
            .add_attribute(book, None, "id".to_string(), "b1".to_string())
            .unwrap();

        assert_eq!(doc.parent(attr), Some(book));
        assert_eq!(doc.first_child(book), None);
        assert_eq!(doc.attributes(book), &[attr]);
        assert_eq!(doc.attribute(book, "id"), Some("b1"));
        assert_eq!(doc.string_value(attr), "b1");
    }

    #[test]
    fn test_add_attribute_to_text_is_rejected() {
        let mut doc = Document::new();
        let t = text(&mut doc, "x");
        assert_eq!(
            doc.add_attribute(t, None, "id".to_string(), "1".to_string()),
            None
        );
    }

    #[test]
    fn test_qualified_names() {
        let mut doc = Document::new();
        let root = doc.root();
        let feed = doc.create_node(NodeKind::Element {
            name: "feed".to_string(),
            prefix: Some("atom".to_string()),
            namespace: None,
            attributes: Vec::new(),
        });
        doc.append_child(root, feed);

        assert_eq!(doc.node_name(feed).as_deref(), Some("atom:feed"));
        assert_eq!(doc.local_name(feed), Some("feed"));
        assert!(doc.has_qualified_name(feed, "atom:feed"));
        assert!(!doc.has_qualified_name(feed, "feed"));
        assert!(!doc.has_qualified_name(feed, "atomfeed"));
    }

    #[test]
    fn test_string_value_of_element_concatenates_text() {
        let doc = Document::parse_str("<a>x<b>y</b><!--c--><![CDATA[z]]></a>").unwrap();
        let a = doc.root_element().unwrap();
        assert_eq!(doc.string_value(a), "xyz");
        assert_eq!(doc.string_value(doc.root()), "xyz");
    }

    #[test]
    fn test_node_ids_follow_document_order() {
        let doc = Document::parse_str(r#"<a x="1"><b y="2"/>t</a>"#).unwrap();
        let a = doc.root_element().unwrap();
        let x = doc.attributes(a)[0];
        let b = doc.first_child(a).unwrap();
        let y = doc.attributes(b)[0];
        let t = doc.last_child(a).unwrap();
        assert!(a < x && x < b && b < y && y < t);
    }
}
