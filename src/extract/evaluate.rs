//! Per-row document parsing and expression evaluation.
//!
//! Each row's XML is parsed fresh into a private [`Document`]; nothing is
//! cached between rows. Every compiled expression is evaluated from the
//! document node and each selected node is serialized into one string of
//! the cell.

use super::compile::{CompiledExpression, ExpressionSet};
use super::diagnostics::{evaluation_failure, parse_failure, Reporter};
use crate::parser::{parse_str_with_options, ParseOptions};
use crate::serial::serialize_node;
use crate::tree::Document;

/// Parses one row's XML value.
///
/// A missing, empty, or malformed value is reported and replaced by an
/// empty document, against which every location path selects nothing.
pub fn parse_document(xml: Option<&str>, options: &ParseOptions, reporter: &dyn Reporter) -> Document {
    let Some(text) = xml.filter(|x| !x.is_empty()) else {
        reporter.report(&parse_failure(xml, None));
        return Document::new();
    };
    match parse_str_with_options(text, options) {
        Ok(doc) => doc,
        Err(error) => {
            tracing::debug!(%error, "row value is not well-formed xml");
            reporter.report(&parse_failure(Some(text), Some(&error)));
            Document::new()
        }
    }
}

/// Evaluates one expression against a parsed row, producing one cell.
///
/// The expression must select a node-set; every node is serialized in
/// document order. Scalar results and evaluation errors are reported and
/// yield an empty cell, as does an expression that failed to compile.
///
/// # Examples
///
/// ```
/// use xmlselect::Document;
/// use xmlselect::extract::{evaluate_expression, CompiledExpression, NullReporter};
///
/// let doc = Document::parse_str("<books><book>A</book><book>B</book></books>").unwrap();
/// let expr = CompiledExpression::compile("/books/book/text()", &NullReporter);
/// assert_eq!(evaluate_expression(&expr, &doc, &NullReporter), vec!["A", "B"]);
/// ```
pub fn evaluate_expression(
    expression: &CompiledExpression,
    doc: &Document,
    reporter: &dyn Reporter,
) -> Vec<String> {
    let CompiledExpression::Compiled { source, xpath } = expression else {
        return Vec::new();
    };
    let nodes = match xpath
        .evaluate(doc, doc.root())
        .and_then(crate::xpath::XPathValue::into_node_set)
    {
        Ok(nodes) => nodes,
        Err(error) => {
            reporter.report(&evaluation_failure(source, &error));
            return Vec::new();
        }
    };
    nodes.into_iter().map(|node| serialize_node(doc, node)).collect()
}

/// Evaluates every expression of `set` against one parsed row.
///
/// The result is index-aligned with `set`, whatever failed.
pub fn evaluate_row(set: &ExpressionSet, doc: &Document, reporter: &dyn Reporter) -> Vec<Vec<String>> {
    set.iter()
        .map(|expression| evaluate_expression(expression, doc, reporter))
        .collect()
}
