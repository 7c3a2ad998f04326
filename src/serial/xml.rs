//! XML serializer.
//!
//! [`serialize`] writes a whole document, XML declaration included.
//! [`serialize_node`] writes a single node as a standalone fragment with no
//! declaration, which is how selected nodes become output values.

use crate::tree::{Document, NodeId, NodeKind};

/// Serializes a document to an XML string.
///
/// # Examples
///
/// ```
/// use xmlselect::Document;
/// use xmlselect::serial::serialize;
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize(&doc);
/// assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
/// assert!(xml.contains("<child>Hello</child>"));
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"");
    out.push_str(doc.version.as_deref().unwrap_or("1.0"));
    out.push('"');
    if let Some(encoding) = &doc.encoding {
        out.push_str(" encoding=\"");
        out.push_str(encoding);
        out.push('"');
    }
    if let Some(standalone) = doc.standalone {
        out.push_str(" standalone=\"");
        out.push_str(if standalone { "yes" } else { "no" });
        out.push('"');
    }
    out.push_str("?>\n");
    for child in doc.children(doc.root()) {
        write_markup(doc, child, &mut out);
    }
    out.push('\n');
    out
}

/// Serializes one node to its standalone textual form.
///
/// Elements are reproduced with their attributes and descendants. Text,
/// CDATA, and attribute nodes yield their unescaped value. A document node
/// yields its children, concatenated.
///
/// ```
/// use xmlselect::Document;
/// use xmlselect::serial::serialize_node;
///
/// let doc = Document::parse_str(r#"<a><b id="1">x &amp; y</b></a>"#).unwrap();
/// let b = doc.first_child(doc.root_element().unwrap()).unwrap();
/// assert_eq!(serialize_node(&doc, b), r#"<b id="1">x &amp; y</b>"#);
/// assert_eq!(serialize_node(&doc, doc.first_child(b).unwrap()), "x & y");
/// ```
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    match doc.kind(id) {
        NodeKind::Text { content } | NodeKind::CData { content } => content.clone(),
        NodeKind::Attribute { value, .. } => value.clone(),
        _ => {
            let mut out = String::new();
            write_markup(doc, id, &mut out);
            out
        }
    }
}

/// Writes a node as XML markup.
fn write_markup(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_markup(doc, child, out);
            }
        }
        NodeKind::Element {
            name,
            prefix,
            attributes,
            ..
        } => {
            out.push('<');
            write_qname(out, prefix.as_deref(), name);
            for &attr in attributes {
                if let NodeKind::Attribute {
                    name,
                    prefix,
                    value,
                } = doc.kind(attr)
                {
                    out.push(' ');
                    write_qname(out, prefix.as_deref(), name);
                    out.push_str("=\"");
                    write_escaped_attr(out, value);
                    out.push('"');
                }
            }
            if doc.first_child(id).is_none() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in doc.children(id) {
                    write_markup(doc, child, out);
                }
                out.push_str("</");
                write_qname(out, prefix.as_deref(), name);
                out.push('>');
            }
        }
        NodeKind::Attribute { name, prefix, value } => {
            write_qname(out, prefix.as_deref(), name);
            out.push_str("=\"");
            write_escaped_attr(out, value);
            out.push('"');
        }
        NodeKind::Text { content } => write_escaped_text(out, content),
        NodeKind::CData { content } => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(d) = data {
                out.push(' ');
                out.push_str(d);
            }
            out.push_str("?>");
        }
    }
}

fn write_qname(out: &mut String, prefix: Option<&str>, local: &str) {
    if let Some(p) = prefix {
        out.push_str(p);
        out.push(':');
    }
    out.push_str(local);
}

/// Escapes character data: `&`, `<`, `>`.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes a double-quoted attribute value. Whitespace characters other than
/// space become character references so a reparse yields the same value.
fn write_escaped_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}
