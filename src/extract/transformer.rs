//! The host-facing XPath transformer.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use super::columns::{output_columns, OutputColumn};
use super::compile::{compile_expressions, ExpressionSet};
use super::diagnostics::Reporter;
use super::evaluate::{evaluate_row, parse_document};
use crate::config::ExtractConfig;
use crate::parser::ParseOptions;

/// Selects values from an XML input field using a list of XPath
/// expressions.
///
/// Expressions are compiled once, in [`new`](Self::new). After that the
/// transformer is read-only: [`transform`](Self::transform) may be called
/// from many threads at once, each call parsing its own document.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use xmlselect::config::ExtractConfig;
/// use xmlselect::extract::{CollectingReporter, XPathTransformer};
///
/// let config = ExtractConfig::new("xml value")
///     .expression("/books/book/text()")
///     .expression("<abracadabra>");
/// let reporter = Arc::new(CollectingReporter::new());
/// let transformer = XPathTransformer::new(&config, reporter.clone());
///
/// let row = transformer.transform(Some("<books><book>A</book><book>B</book></books>"));
/// assert_eq!(row, vec![vec!["A".to_string(), "B".to_string()], vec![]]);
/// assert_eq!(reporter.messages().len(), 1);
/// ```
pub struct XPathTransformer {
    field: String,
    expressions: ExpressionSet,
    options: ParseOptions,
    reporter: Arc<dyn Reporter>,
}

impl XPathTransformer {
    /// Display name of the component.
    pub const NAME: &'static str = "Select values from XML";

    /// One-line description of the component.
    pub const DESCRIPTION: &'static str =
        "Select values from XML using a number of XPath expressions";

    /// Compiles the configured expressions. Compile failures are reported
    /// now, once each; their columns stay empty for every row.
    pub fn new(config: &ExtractConfig, reporter: Arc<dyn Reporter>) -> Self {
        let expressions = compile_expressions(&config.expressions, reporter.as_ref());
        tracing::info!(
            column = %config.column,
            expressions = expressions.len(),
            failed = expressions.failed_count(),
            "xpath transformer initialized"
        );
        Self {
            field: config.column.clone(),
            expressions,
            options: config.parse_options(),
            reporter,
        }
    }

    /// The input field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn expressions(&self) -> &ExpressionSet {
        &self.expressions
    }

    /// One column per configured expression, named `"field (expression)"`.
    #[must_use]
    pub fn output_columns(&self) -> Vec<OutputColumn> {
        let sources: Vec<&str> = self.expressions.sources().collect();
        output_columns(&self.field, &sources)
    }

    /// Extracts the values of one row.
    ///
    /// The result always has one cell per configured expression. Problems
    /// with the value or an expression are reported, never returned.
    #[must_use]
    pub fn transform(&self, xml: Option<&str>) -> Vec<Vec<String>> {
        let reporter = self.reporter.as_ref();
        let doc = parse_document(xml, &self.options, reporter);
        evaluate_row(&self.expressions, &doc, reporter)
    }

    /// Extracts the values of many rows, spreading them over the available
    /// cores. Results are in row order.
    #[must_use]
    pub fn transform_batch(&self, rows: &[Option<&str>]) -> Vec<Vec<Vec<String>>> {
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        if workers <= 1 || rows.len() <= 1 {
            return rows.iter().map(|row| self.transform(*row)).collect();
        }
        let chunk_size = rows.len().div_ceil(workers);
        tracing::debug!(rows = rows.len(), workers, chunk_size, "transforming batch");
        thread::scope(|scope| {
            let handles: Vec<_> = rows
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|row| self.transform(*row))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

impl std::fmt::Debug for XPathTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XPathTransformer")
            .field("field", &self.field)
            .field("expressions", &self.expressions)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
