//! Low-level input cursor for the XML parser.
//!
//! [`ParserInput`] walks a `&str` while tracking line, column, and byte
//! offset, and provides the lexical primitives of XML 1.0: names, quoted
//! values, character and entity references, and attribute-value
//! normalization.
//!
//! Besides the five predefined entities, general entities declared in the
//! internal DTD subset are expanded. Every expansion is counted against
//! [`ParserInput::set_max_entity_expansions`] and self-reference is refused,
//! so "billion laughs" style documents fail early. External entities are
//! never resolved.

use std::collections::HashMap;

use crate::error::{ParseError, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum number of attributes on a single element.
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Default maximum number of entity expansions per document.
pub(crate) const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 10_000;

/// How many entity references may be open inside one another.
const MAX_ENTITY_NESTING: usize = 40;

/// The namespace URI bound to the reserved `xml` prefix.
pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Returns `true` if `c` matches the XML 1.0 `Char` production (§2.2).
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a `NameStartChar` (XML 1.0 §2.3).
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a `NameChar` (XML 1.0 §2.3).
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Splits `prefix:local` into its parts. Names without a colon have no prefix.
pub(crate) fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// A general entity declared in the internal subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntityDecl {
    /// Literal replacement text, references not yet expanded.
    Internal(String),
    /// Declared with `SYSTEM` or `PUBLIC`.
    External,
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

/// Cursor over the XML source text.
pub(crate) struct ParserInput<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    entities: HashMap<String, EntityDecl>,
    entity_expansions: u32,
    max_entity_expansions: u32,
    /// Names of the entities currently being expanded, innermost last.
    expanding: Vec<String>,
}

impl<'a> ParserInput<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            entities: HashMap::new(),
            entity_expansions: 0,
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
            expanding: Vec::new(),
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    pub fn set_max_entity_expansions(&mut self, max: u32) {
        self.max_entity_expansions = max;
    }

    /// Records a general entity. The first declaration of a name is binding
    /// (XML 1.0 §4.2).
    pub fn declare_entity(&mut self, name: String, decl: EntityDecl) {
        self.entities.entry(name).or_insert(decl);
    }

    /// Records entry into an element, failing once the depth limit is passed.
    pub fn enter_element(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn leave_element(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn looking_at(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Moves past one character, keeping line and column current.
    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Moves past `count` characters.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek_char() {
                Some(ch) => self.bump(ch),
                None => break,
            }
        }
    }

    /// Consumes one character, folding `\r\n` and lone `\r` into `\n`
    /// (XML 1.0 §2.11) and rejecting characters outside `Char`.
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        self.bump(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.bump('\n');
            }
            return Ok('\n');
        }
        Ok(ch)
    }

    pub fn expect(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.looking_at(expected) {
            self.advance(expected.chars().count());
            Ok(())
        } else {
            let found = self
                .peek_char()
                .map_or_else(|| "end of input".to_string(), |c| format!("'{c}'"));
            Err(self.fatal(format!("expected '{expected}', found {found}")))
        }
    }

    /// Skips XML whitespace. Returns `true` if anything was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance(1);
        }
        self.pos > start
    }

    pub fn skip_whitespace_required(&mut self) -> Result<(), ParseError> {
        if self.skip_whitespace() {
            Ok(())
        } else {
            Err(self.fatal("whitespace required"))
        }
    }

    /// Consumes text up to (not including) `delimiter`, normalizing line
    /// endings. Fails if the input ends first.
    pub fn take_until(&mut self, delimiter: &str, context: &str) -> Result<String, ParseError> {
        let mut out = String::new();
        while !self.looking_at(delimiter) {
            if self.at_end() {
                return Err(self.fatal(format!("unexpected end of input in {context}")));
            }
            out.push(self.next_char()?);
        }
        Ok(out)
    }

    /// Parses an XML `Name` (XML 1.0 §2.3 production \[5\]).
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if is_name_start_char(c) => self.bump(c),
            Some(c) => return Err(self.fatal(format!("invalid name start character: '{c}'"))),
            None => return Err(self.fatal("expected name, found end of input")),
        }
        while let Some(c) = self.peek_char().filter(|&c| is_name_char(c)) {
            self.bump(c);
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Parses a quoted literal with no reference expansion.
    pub fn parse_quoted_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q as char,
            _ => return Err(self.fatal("expected quoted value")),
        };
        self.bump(quote);
        let value = self.take_until(&quote.to_string(), "quoted value")?;
        self.bump(quote);
        Ok(value)
    }

    /// Parses `&name;`, `&#N;` or `&#xH;` and returns the replacement text.
    pub fn parse_reference(&mut self) -> Result<String, ParseError> {
        self.expect("&")?;
        if self.peek() == Some(b'#') {
            self.advance(1);
            let hex = self.peek() == Some(b'x');
            if hex {
                self.advance(1);
            }
            let start = self.pos;
            while self
                .peek()
                .is_some_and(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            {
                self.advance(1);
            }
            let digits = &self.input[start..self.pos];
            let c = self.char_reference(digits, hex)?;
            self.expect(";")?;
            return Ok(c.to_string());
        }

        let name = self.parse_name()?;
        self.expect(";")?;
        match predefined_entity(&name) {
            Some(replacement) => Ok(replacement.to_string()),
            None => self.expand_entity(&name),
        }
    }

    /// Decodes the digits of a character reference.
    fn char_reference(&self, digits: &str, hex: bool) -> Result<char, ParseError> {
        if digits.is_empty() {
            return Err(self.fatal("empty character reference"));
        }
        let code = u32::from_str_radix(digits, if hex { 16 } else { 10 })
            .map_err(|_| self.fatal("character reference out of range"))?;
        char::from_u32(code).filter(|&c| is_xml_char(c)).ok_or_else(|| {
            self.fatal(format!(
                "character reference &#x{code:X}; does not refer to a valid XML character"
            ))
        })
    }

    /// Returns the fully expanded replacement text of a declared entity.
    fn expand_entity(&mut self, name: &str) -> Result<String, ParseError> {
        let value = match self.entities.get(name) {
            Some(EntityDecl::Internal(value)) => value.clone(),
            Some(EntityDecl::External) => {
                return Err(self.fatal(format!(
                    "reference to external entity '{name}' is not supported"
                )));
            }
            None => return Err(self.fatal(format!("undeclared entity reference: &{name};"))),
        };

        self.entity_expansions += 1;
        if self.entity_expansions > self.max_entity_expansions {
            return Err(self.fatal(format!(
                "entity expansion limit exceeded ({})",
                self.max_entity_expansions
            )));
        }
        if self.expanding.iter().any(|open| open == name) {
            return Err(self.fatal(format!("recursive entity reference: &{name};")));
        }
        if self.expanding.len() >= MAX_ENTITY_NESTING {
            return Err(self.fatal("entity references nested too deeply"));
        }
        if value.contains('<') {
            return Err(self.fatal(format!(
                "entity '&{name};' contains markup, which is not supported"
            )));
        }

        self.expanding.push(name.to_string());
        let expanded = self.expand_entity_text(&value);
        self.expanding.pop();
        expanded
    }

    /// Expands the references inside an entity's replacement text.
    fn expand_entity_text(&mut self, text: &str) -> Result<String, ParseError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let semi = after
                .find(';')
                .ok_or_else(|| self.fatal("unterminated reference in entity value"))?;
            let reference = &after[..semi];
            rest = &after[semi + 1..];

            if let Some(hex) = reference.strip_prefix("#x") {
                out.push(self.char_reference(hex, true)?);
            } else if let Some(decimal) = reference.strip_prefix('#') {
                out.push(self.char_reference(decimal, false)?);
            } else if let Some(replacement) = predefined_entity(reference) {
                out.push_str(replacement);
            } else {
                out.push_str(&self.expand_entity(reference)?);
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Parses a quoted attribute value, expanding references and
    /// normalizing whitespace characters to spaces (XML 1.0 §3.3.3).
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fatal("attribute value must be quoted")),
        };
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    return Ok(value);
                }
                Some(b'&') => value.push_str(&self.parse_reference()?),
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(_) => match self.next_char()? {
                    '\n' | '\t' => value.push(' '),
                    ch => value.push(ch),
                },
            }
        }
    }

    /// Creates a `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.location())
    }
}

/// Tracks `xmlns` bindings while descending through elements.
pub(crate) struct NamespaceResolver {
    /// One frame per open element; `None` keys the default namespace.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        Self {
            scopes: vec![vec![(Some("xml".to_string()), XML_NAMESPACE.to_string())]],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn bind(&mut self, prefix: Option<String>, uri: String) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.push((prefix, uri));
        }
    }

    /// Resolves a prefix (or the default namespace for `None`).
    /// An empty binding (`xmlns=""`) undeclares the namespace.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column_tracking() {
        let mut input = ParserInput::new("ab\ncd");
        input.advance(2);
        assert_eq!(input.location().column, 3);
        input.advance(1);
        assert_eq!(input.location().line, 2);
        assert_eq!(input.location().column, 1);
        assert_eq!(input.location().byte_offset, 3);
    }

    #[test]
    fn test_next_char_normalizes_carriage_returns() {
        let mut input = ParserInput::new("a\r\nb\rc");
        let chars: Vec<char> = (0..5).map(|_| input.next_char().unwrap()).collect();
        assert_eq!(chars, vec!['a', '\n', 'b', '\n', 'c']);
        assert!(input.at_end());
    }

    #[test]
    fn test_next_char_rejects_control_characters() {
        let mut input = ParserInput::new("\u{1}");
        assert!(input.next_char().is_err());
    }

    #[test]
    fn test_parse_name_with_prefix() {
        let mut input = ParserInput::new("dc:title>");
        assert_eq!(input.parse_name().unwrap(), "dc:title");
        assert_eq!(input.peek(), Some(b'>'));
    }

    #[test]
    fn test_parse_name_rejects_digit_start() {
        let mut input = ParserInput::new("1abc");
        assert!(input.parse_name().is_err());
    }

    #[test]
    fn test_predefined_entities() {
        for (source, expected) in [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&apos;", "'"),
            ("&quot;", "\""),
            ("&#65;", "A"),
            ("&#x20AC;", "\u{20AC}"),
        ] {
            let mut input = ParserInput::new(source);
            assert_eq!(input.parse_reference().unwrap(), expected, "{source}");
        }
    }

    #[test]
    fn test_undeclared_entity_is_an_error() {
        let mut input = ParserInput::new("&nbsp;");
        let err = input.parse_reference().unwrap_err();
        assert!(err.message.contains("&nbsp;"));
    }

    fn with_entities<'a>(source: &'a str, entities: &[(&str, &str)]) -> ParserInput<'a> {
        let mut input = ParserInput::new(source);
        for (name, value) in entities {
            input.declare_entity((*name).to_string(), EntityDecl::Internal((*value).to_string()));
        }
        input
    }

    #[test]
    fn test_declared_entity_is_expanded() {
        let mut input = with_entities(
            "&title;",
            &[("title", "&name; &amp; &#x53;ons"), ("name", "Dombey")],
        );
        assert_eq!(input.parse_reference().unwrap(), "Dombey & Sons");
    }

    #[test]
    fn test_first_entity_declaration_wins() {
        let mut input = with_entities("&e;", &[("e", "first"), ("e", "second")]);
        assert_eq!(input.parse_reference().unwrap(), "first");
    }

    #[test]
    fn test_entity_expansion_limit() {
        let mut input = with_entities("&b;", &[("a", "x"), ("b", "&a;&a;&a;")]);
        input.set_max_entity_expansions(3);
        let err = input.parse_reference().unwrap_err();
        assert_eq!(err.message, "entity expansion limit exceeded (3)");

        let mut input = with_entities("&b;", &[("a", "x"), ("b", "&a;&a;&a;")]);
        input.set_max_entity_expansions(4);
        assert_eq!(input.parse_reference().unwrap(), "xxx");
    }

    #[test]
    fn test_recursive_entities_are_errors() {
        let mut input = with_entities("&a;", &[("a", "x&b;"), ("b", "y&a;")]);
        let err = input.parse_reference().unwrap_err();
        assert!(err.message.contains("recursive entity reference"), "{}", err.message);
    }

    #[test]
    fn test_entity_nesting_is_bounded() {
        let names: Vec<String> = (0..=MAX_ENTITY_NESTING).map(|i| format!("e{i}")).collect();
        let mut input = ParserInput::new("&e0;");
        for (i, name) in names.iter().enumerate() {
            let value = names.get(i + 1).map_or_else(|| "end".to_string(), |next| format!("&{next};"));
            input.declare_entity(name.clone(), EntityDecl::Internal(value));
        }
        let err = input.parse_reference().unwrap_err();
        assert!(err.message.contains("nested too deeply"), "{}", err.message);
    }

    #[test]
    fn test_external_and_markup_entities_are_errors() {
        let mut input = ParserInput::new("&xxe;");
        input.declare_entity("xxe".to_string(), EntityDecl::External);
        let err = input.parse_reference().unwrap_err();
        assert_eq!(err.message, "reference to external entity 'xxe' is not supported");

        let mut input = with_entities("&b;", &[("b", "<b>bold</b>")]);
        assert!(input.parse_reference().unwrap_err().message.contains("markup"));
    }

    #[test]
    fn test_char_reference_to_nul_is_an_error() {
        let mut input = ParserInput::new("&#0;");
        assert!(input.parse_reference().is_err());
    }

    #[test]
    fn test_attribute_value_normalization() {
        let mut input = ParserInput::new("'a\tb\r\nc &amp; d'");
        assert_eq!(input.parse_attribute_value().unwrap(), "a b c & d");
    }

    #[test]
    fn test_attribute_value_rejects_lt() {
        let mut input = ParserInput::new("\"a<b\"");
        assert!(input.parse_attribute_value().is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut input = ParserInput::new("");
        input.set_max_depth(2);
        assert!(input.enter_element().is_ok());
        assert!(input.enter_element().is_ok());
        assert!(input.enter_element().is_err());
    }

    #[test]
    fn test_take_until_reports_context() {
        let mut input = ParserInput::new("abc");
        let err = input.take_until("-->", "comment").unwrap_err();
        assert!(err.message.contains("comment"));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("dc:title"), (Some("dc"), "title"));
        assert_eq!(split_name("title"), (None, "title"));
    }

    #[test]
    fn test_namespace_scopes() {
        let mut ns = NamespaceResolver::new();
        assert_eq!(ns.resolve(Some("xml")), Some(XML_NAMESPACE));
        assert_eq!(ns.resolve(None), None);

        ns.push_scope();
        ns.bind(None, "http://www.w3.org/2005/Atom".to_string());
        ns.push_scope();
        ns.bind(None, String::new());
        assert_eq!(ns.resolve(None), None);
        ns.pop_scope();
        assert_eq!(ns.resolve(None), Some("http://www.w3.org/2005/Atom"));
        ns.pop_scope();
        assert_eq!(ns.resolve(None), None);
    }
}
