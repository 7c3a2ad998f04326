//! Expression compilation.
//!
//! Every configured expression is compiled exactly once, before any row is
//! seen. A failure is reported and remembered in place, so the compiled set
//! always lines up index for index with the configured list.

use std::ops::Index;

use super::diagnostics::{compile_failure, Reporter};
use crate::xpath::{XPath, XPathError};

/// One configured expression after compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledExpression {
    Compiled { source: String, xpath: XPath },
    /// Always evaluates to an empty cell.
    Failed { source: String, error: XPathError },
}

impl CompiledExpression {
    /// Compiles one expression. A failure is reported to `reporter`.
    pub fn compile(source: &str, reporter: &dyn Reporter) -> Self {
        match XPath::compile(source) {
            Ok(xpath) => Self::Compiled {
                source: source.to_string(),
                xpath,
            },
            Err(error) => {
                tracing::debug!(expression = source, %error, "expression failed to compile");
                reporter.report(&compile_failure(source, &error));
                Self::Failed {
                    source: source.to_string(),
                    error,
                }
            }
        }
    }

    /// The expression text as configured.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Compiled { source, .. } | Self::Failed { source, .. } => source,
        }
    }

    #[must_use]
    pub fn xpath(&self) -> Option<&XPath> {
        match self {
            Self::Compiled { xpath, .. } => Some(xpath),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Compiled { .. })
    }
}

/// The compiled form of a configured expression list, in configured order.
///
/// Immutable once built; shared read-only by every row evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionSet {
    expressions: Vec<CompiledExpression>,
}

impl ExpressionSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledExpression> {
        self.expressions.iter()
    }

    /// The configured expression strings, in order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.expressions.iter().map(CompiledExpression::source)
    }

    /// Number of expressions that failed to compile.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.expressions.iter().filter(|e| !e.is_compiled()).count()
    }
}

impl Index<usize> for ExpressionSet {
    type Output = CompiledExpression;

    fn index(&self, index: usize) -> &CompiledExpression {
        &self.expressions[index]
    }
}

impl<'a> IntoIterator for &'a ExpressionSet {
    type Item = &'a CompiledExpression;
    type IntoIter = std::slice::Iter<'a, CompiledExpression>;

    fn into_iter(self) -> Self::IntoIter {
        self.expressions.iter()
    }
}

/// Compiles every expression, reporting each failure once.
///
/// The result has the same length and order as `expressions`.
///
/// # Examples
///
/// ```
/// use xmlselect::extract::{compile_expressions, CollectingReporter};
///
/// let reporter = CollectingReporter::new();
/// let set = compile_expressions(&["/a/b", "<abracadabra>"], &reporter);
/// assert_eq!(set.len(), 2);
/// assert!(set[0].is_compiled());
/// assert!(!set[1].is_compiled());
/// assert_eq!(reporter.messages().len(), 1);
/// ```
pub fn compile_expressions<S: AsRef<str>>(expressions: &[S], reporter: &dyn Reporter) -> ExpressionSet {
    let expressions: Vec<CompiledExpression> = expressions
        .iter()
        .map(|source| CompiledExpression::compile(source.as_ref(), reporter))
        .collect();
    let failed = expressions.iter().filter(|e| !e.is_compiled()).count();
    tracing::debug!(
        total = expressions.len(),
        failed,
        "compiled expression set"
    );
    ExpressionSet { expressions }
}
