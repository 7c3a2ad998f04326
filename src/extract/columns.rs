//! Output column naming.
//!
//! Column names depend only on configuration, so hosts can describe the
//! output shape before any row is processed.

use std::fmt;

use serde::Serialize;

/// The value type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// A list of strings, one per selected node.
    TextList,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextList => f.write_str("list<text>"),
        }
    }
}

/// One output column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// The name of the column produced by `expression` on input field `field`.
///
/// ```
/// use xmlselect::extract::column_name;
///
/// assert_eq!(column_name("xml value", "/books/book"), "xml value (/books/book)");
/// ```
#[must_use]
pub fn column_name(field: &str, expression: &str) -> String {
    format!("{field} ({expression})")
}

/// One column per expression, in order. Expressions that fail to compile
/// still get a column.
#[must_use]
pub fn output_columns<S: AsRef<str>>(field: &str, expressions: &[S]) -> Vec<OutputColumn> {
    expressions
        .iter()
        .map(|expression| OutputColumn {
            name: column_name(field, expression.as_ref()),
            kind: ColumnKind::TextList,
        })
        .collect()
}
