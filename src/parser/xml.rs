//! Recursive descent parser for XML 1.0 documents.
//!
//! Builds a [`Document`] directly while scanning. The prolog may hold an XML
//! declaration, comments, processing instructions, and a DOCTYPE. Of the
//! internal subset only general entity declarations are kept; every other
//! markup declaration is skipped.

use crate::error::ParseError;
use crate::tree::{Document, NodeId, NodeKind};

use super::input::{split_name, EntityDecl, NamespaceResolver, ParserInput};
use super::ParseOptions;

/// An attribute as written in a start tag, before it is attached.
struct RawAttribute {
    qname: String,
    value: String,
}

pub(crate) struct XmlParser<'a> {
    input: ParserInput<'a>,
    doc: Document,
    options: ParseOptions,
    ns: NamespaceResolver,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, options: &ParseOptions) -> Self {
        let mut cursor = ParserInput::new(input);
        cursor.set_max_depth(options.max_depth);
        cursor.set_max_entity_expansions(options.max_entity_expansions);
        Self {
            input: cursor,
            doc: Document::new(),
            options: options.clone(),
            ns: NamespaceResolver::new(),
        }
    }

    /// Parses the whole input as a document.
    pub fn parse(mut self) -> Result<Document, ParseError> {
        if self.input.looking_at("<?xml")
            && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n'))
        {
            self.parse_xml_declaration()?;
        }

        let root = self.doc.root();
        self.parse_misc(root)?;

        if self.input.looking_at("<!DOCTYPE") {
            self.parse_doctype()?;
            self.parse_misc(root)?;
        }

        match (self.input.peek(), self.input.peek_at(1)) {
            (Some(b'<'), Some(next)) if next != b'!' && next != b'?' && next != b'/' => {
                self.parse_element(root)?;
            }
            _ => return Err(self.input.fatal("missing root element")),
        }

        self.parse_misc(root)?;
        if !self.input.at_end() {
            return Err(self.input.fatal("content after document element"));
        }
        Ok(self.doc)
    }

    // --- Prolog ---

    fn parse_xml_declaration(&mut self) -> Result<(), ParseError> {
        self.input.expect("<?xml")?;
        self.input.skip_whitespace_required()?;

        let version = self.pseudo_attribute("version")?;
        if !version
            .strip_prefix("1.")
            .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(self.input.fatal(format!("invalid version number: '{version}'")));
        }
        self.doc.version = Some(version);

        self.input.skip_whitespace();
        if self.input.looking_at("encoding") {
            self.doc.encoding = Some(self.pseudo_attribute("encoding")?);
            self.input.skip_whitespace();
        }
        if self.input.looking_at("standalone") {
            let standalone = match self.pseudo_attribute("standalone")?.as_str() {
                "yes" => true,
                "no" => false,
                _ => return Err(self.input.fatal("standalone must be 'yes' or 'no'")),
            };
            self.doc.standalone = Some(standalone);
            self.input.skip_whitespace();
        }
        self.input.expect("?>")
    }

    /// Parses `name = "value"` inside the XML declaration.
    fn pseudo_attribute(&mut self, name: &str) -> Result<String, ParseError> {
        self.input.expect(name)?;
        self.input.skip_whitespace();
        self.input.expect("=")?;
        self.input.skip_whitespace();
        self.input.parse_quoted_value()
    }

    /// Comments, PIs, and whitespace outside the root element. Whitespace
    /// here is not part of the document.
    fn parse_misc(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at("<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at("<?") {
                self.parse_processing_instruction(parent)?;
            } else {
                return Ok(());
            }
        }
    }

    /// Parses `<!DOCTYPE ...>`. The external ID is skipped and the internal
    /// subset is scanned for entity declarations.
    fn parse_doctype(&mut self) -> Result<(), ParseError> {
        self.input.expect("<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        self.input.parse_name()?;

        loop {
            self.input.skip_whitespace();
            match self.input.peek() {
                None => return Err(self.input.fatal("unexpected end of input in DOCTYPE")),
                Some(b'"' | b'\'') => {
                    self.input.parse_quoted_value()?;
                }
                Some(b'[') => {
                    self.input.advance(1);
                    self.parse_internal_subset()?;
                }
                Some(b'>') => {
                    self.input.advance(1);
                    return Ok(());
                }
                Some(_) => {
                    self.input.next_char()?;
                }
            }
        }
    }

    /// Scans the internal subset up to and including its closing `]`.
    fn parse_internal_subset(&mut self) -> Result<(), ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.looking_at("]") {
                self.input.advance(1);
                return Ok(());
            } else if self.input.looking_at("<!--") {
                self.input.advance(4);
                self.input.take_until("-->", "comment")?;
                self.input.advance(3);
            } else if self.input.looking_at("<?") {
                self.input.advance(2);
                self.input.take_until("?>", "processing instruction")?;
                self.input.advance(2);
            } else if self.input.looking_at("<!ENTITY") {
                self.parse_entity_declaration()?;
            } else if self.input.looking_at("<!") {
                self.skip_markup_declaration()?;
            } else if self.input.looking_at("%") {
                // Parameter entity reference; its content is never read.
                self.input.advance(1);
                self.input.parse_name()?;
                self.input.expect(";")?;
            } else if self.input.at_end() {
                return Err(self.input.fatal("unexpected end of input in DOCTYPE"));
            } else {
                return Err(self.input.fatal("unexpected content in internal subset"));
            }
        }
    }

    /// `<!ENTITY name "value">` or `<!ENTITY name SYSTEM "uri">`. Parameter
    /// entities are parsed and dropped.
    fn parse_entity_declaration(&mut self) -> Result<(), ParseError> {
        self.input.expect("<!ENTITY")?;
        self.input.skip_whitespace_required()?;
        let parameter = self.input.looking_at("%");
        if parameter {
            self.input.advance(1);
            self.input.skip_whitespace_required()?;
        }
        let name = self.input.parse_name()?;
        self.input.skip_whitespace_required()?;

        let decl = if matches!(self.input.peek(), Some(b'"' | b'\'')) {
            let value = self.input.parse_quoted_value()?;
            self.input.skip_whitespace();
            self.input.expect(">")?;
            EntityDecl::Internal(value)
        } else if self.input.looking_at("SYSTEM") || self.input.looking_at("PUBLIC") {
            self.skip_declaration_rest()?;
            EntityDecl::External
        } else {
            return Err(self.input.fatal(format!("malformed declaration of entity '{name}'")));
        };

        if !parameter {
            self.input.declare_entity(name, decl);
        }
        Ok(())
    }

    /// Skips `<!ELEMENT ...>`, `<!ATTLIST ...>` and `<!NOTATION ...>`.
    fn skip_markup_declaration(&mut self) -> Result<(), ParseError> {
        self.input.expect("<!")?;
        self.skip_declaration_rest()
    }

    /// Skips to the `>` closing a declaration, stepping over quoted values.
    fn skip_declaration_rest(&mut self) -> Result<(), ParseError> {
        loop {
            match self.input.peek() {
                None => return Err(self.input.fatal("unexpected end of input in DOCTYPE")),
                Some(b'"' | b'\'') => {
                    self.input.parse_quoted_value()?;
                }
                Some(b'>') => {
                    self.input.advance(1);
                    return Ok(());
                }
                Some(_) => {
                    self.input.next_char()?;
                }
            }
        }
    }

    // --- Elements ---

    fn parse_element(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.enter_element()?;
        self.input.expect("<")?;
        let qname = self.input.parse_name()?;
        let raw_attributes = self.parse_attributes()?;

        let declares_namespaces = raw_attributes
            .iter()
            .any(|a| a.qname == "xmlns" || a.qname.starts_with("xmlns:"));
        if declares_namespaces {
            self.ns.push_scope();
            for attr in &raw_attributes {
                if attr.qname == "xmlns" {
                    self.ns.bind(None, attr.value.clone());
                } else if let Some(prefix) = attr.qname.strip_prefix("xmlns:") {
                    self.ns.bind(Some(prefix.to_string()), attr.value.clone());
                }
            }
        }

        let (prefix, local) = split_name(&qname);
        if prefix.is_some_and(str::is_empty) || local.is_empty() || local.contains(':') {
            return Err(self.input.fatal(format!("invalid qualified name: '{qname}'")));
        }
        let namespace = self.ns.resolve(prefix).map(str::to_string);
        if prefix.is_some() && namespace.is_none() {
            tracing::debug!(element = %qname, "element prefix is not bound to a namespace");
        }

        let element = self.doc.create_node(NodeKind::Element {
            name: local.to_string(),
            prefix: prefix.map(str::to_string),
            namespace,
            attributes: Vec::new(),
        });
        for attr in raw_attributes {
            let (attr_prefix, attr_local) = split_name(&attr.qname);
            self.doc.add_attribute(
                element,
                attr_prefix.map(str::to_string),
                attr_local.to_string(),
                attr.value,
            );
        }
        self.doc.append_child(parent, element);

        if self.input.looking_at("/>") {
            self.input.advance(2);
        } else {
            self.input.expect(">")?;
            self.parse_content(element)?;
            self.input.expect("</")?;
            let end = self.input.parse_name()?;
            if end != qname {
                return Err(self.input.fatal(format!(
                    "mismatched end tag: expected '</{qname}>', found '</{end}>'"
                )));
            }
            self.input.skip_whitespace();
            self.input.expect(">")?;
        }

        if declares_namespaces {
            self.ns.pop_scope();
        }
        self.input.leave_element();
        Ok(())
    }

    /// Parses the attribute list of a start tag, enforcing uniqueness and
    /// the attribute-count limit.
    fn parse_attributes(&mut self) -> Result<Vec<RawAttribute>, ParseError> {
        let mut attributes: Vec<RawAttribute> = Vec::new();
        loop {
            let had_whitespace = self.input.skip_whitespace();
            if matches!(self.input.peek(), Some(b'>') | None) || self.input.looking_at("/>") {
                return Ok(attributes);
            }
            if !had_whitespace {
                return Err(self.input.fatal("whitespace required between attributes"));
            }

            let qname = self.input.parse_name()?;
            if attributes.iter().any(|a| a.qname == qname) {
                return Err(self.input.fatal(format!("duplicate attribute: '{qname}'")));
            }
            if attributes.len() >= self.options.max_attributes as usize {
                return Err(self.input.fatal(format!(
                    "too many attributes on element (limit {})",
                    self.options.max_attributes
                )));
            }
            self.input.skip_whitespace();
            self.input.expect("=")?;
            self.input.skip_whitespace();
            let value = self.input.parse_attribute_value()?;
            attributes.push(RawAttribute { qname, value });
        }
    }

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.input.at_end() {
                return Err(self.input.fatal("unexpected end of input in element content"));
            }
            if self.input.looking_at("</") {
                return Ok(());
            }
            if self.input.looking_at("<![CDATA[") {
                self.parse_cdata(parent)?;
            } else if self.input.looking_at("<!--") {
                self.parse_comment(parent)?;
            } else if self.input.looking_at("<?") {
                self.parse_processing_instruction(parent)?;
            } else if self.input.peek() == Some(b'<') {
                self.parse_element(parent)?;
            } else {
                self.parse_char_data(parent)?;
            }
        }
    }

    // --- Character data and markup ---

    fn parse_char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();
        loop {
            match self.input.peek() {
                None | Some(b'<') => break,
                Some(b'&') => text.push_str(&self.input.parse_reference()?),
                Some(b']') if self.input.looking_at("]]>") => {
                    return Err(self.input.fatal("']]>' not allowed in character data"));
                }
                Some(_) => text.push(self.input.next_char()?),
            }
        }

        if self.options.no_blanks && text.chars().all(|c| matches!(c, ' ' | '\t' | '\n')) {
            return Ok(());
        }
        let node = self.doc.create_node(NodeKind::Text { content: text });
        self.doc.append_child(parent, node);
        Ok(())
    }

    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.expect("<!--")?;
        let content = self.input.take_until("--", "comment")?;
        if !self.input.looking_at("-->") {
            return Err(self.input.fatal("'--' not allowed inside comments"));
        }
        self.input.advance(3);
        let node = self.doc.create_node(NodeKind::Comment { content });
        self.doc.append_child(parent, node);
        Ok(())
    }

    fn parse_cdata(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.expect("<![CDATA[")?;
        let content = self.input.take_until("]]>", "CDATA section")?;
        self.input.advance(3);
        let node = self.doc.create_node(NodeKind::CData { content });
        self.doc.append_child(parent, node);
        Ok(())
    }

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.expect("<?")?;
        let target = self.input.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self
                .input
                .fatal("XML declaration allowed only at the start of the document"));
        }
        let data = if self.input.skip_whitespace() {
            Some(self.input.take_until("?>", "processing instruction")?)
        } else {
            None
        };
        self.input.expect("?>")?;
        let node = self.doc.create_node(NodeKind::ProcessingInstruction {
            target,
            data: data.filter(|d| !d.is_empty()),
        });
        self.doc.append_child(parent, node);
        Ok(())
    }
}
