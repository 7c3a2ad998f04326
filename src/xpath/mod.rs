//! `XPath` 1.0 query language implementation.
//!
//! An implementation of `XPath` 1.0 (<https://www.w3.org/TR/xpath-10/>):
//! tokenizing, parsing ("compiling") and evaluating expressions against a
//! parsed [`Document`].
//!
//! # Quick Start
//!
//! ```
//! use xmlselect::Document;
//! use xmlselect::xpath::XPath;
//!
//! let xpath = XPath::compile("/books/book[2]/text()").unwrap();
//! let doc = Document::parse_str("<books><book>A</book><book>B</book></books>").unwrap();
//! let nodes = xpath.evaluate(&doc, doc.root()).unwrap().into_node_set().unwrap();
//! assert_eq!(doc.string_value(nodes[0]), "B");
//! ```
//!
//! # Known Limitations
//!
//! - The `namespace::` axis is always empty. Namespace nodes are not
//!   materialized.
//! - `id()` recognizes `xml:id` attributes only, since no DTD is read.
//!
//! # Submodules
//!
//! - [`ast`]: Abstract syntax tree types for parsed expressions.
//! - [`lexer`]: Tokenizer for expression strings.
//! - [`types`]: Value types, conversions, and errors.
//! - [`parser`]: Recursive descent parser.
//! - [`eval`]: Expression evaluator against a document tree.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod types;

use std::fmt;

pub use eval::XPathContext;
pub use types::{XPathError, XPathValue};

use crate::tree::{Document, NodeId};

/// A compiled `XPath` expression.
///
/// Compiling checks syntax and the core function library once; the result
/// is immutable and can be shared between threads and evaluated against
/// any number of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    source: String,
    expr: ast::Expr,
}

impl XPath {
    /// Compiles an expression.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] if the expression is malformed or calls a
    /// function outside the core library.
    pub fn compile(source: &str) -> Result<Self, XPathError> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The expression text as given to [`compile`](Self::compile).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression tree.
    #[must_use]
    pub fn expr(&self) -> &ast::Expr {
        &self.expr
    }

    /// Evaluates against `doc` with `context_node` as the context node.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] if evaluation fails, e.g. on an unbound
    /// variable or a type error.
    pub fn evaluate(&self, doc: &Document, context_node: NodeId) -> Result<XPathValue, XPathError> {
        XPathContext::new(doc, context_node).evaluate(&self.expr)
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compiles and evaluates an expression in one call.
///
/// For evaluating the same expression many times, compile it once with
/// [`XPath::compile`].
///
/// # Errors
///
/// Returns [`XPathError`] if the expression is malformed or evaluation fails.
pub fn evaluate(
    doc: &Document,
    context_node: NodeId,
    expression: &str,
) -> Result<XPathValue, XPathError> {
    XPath::compile(expression)?.evaluate(doc, context_node)
}
