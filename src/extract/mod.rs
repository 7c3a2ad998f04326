//! Selecting values from XML fields.
//!
//! The pieces of the "Select values from XML" transformer:
//!
//! - [`compile`]: compiling the configured expressions once, up front.
//! - [`evaluate`]: parsing a row's XML and evaluating every expression.
//! - [`columns`]: naming the output columns.
//! - [`diagnostics`]: the [`Reporter`] channel failures are published on.
//! - [`transformer`]: [`XPathTransformer`], tying it all together.
//!
//! A row never fails. A bad expression, a bad document, or an expression
//! that does not select nodes empties the affected cells and produces a
//! diagnostic; the row keeps one cell per configured expression.

pub mod columns;
pub mod compile;
pub mod diagnostics;
pub mod evaluate;
pub mod transformer;

pub use columns::{column_name, output_columns, ColumnKind, OutputColumn};
pub use compile::{compile_expressions, CompiledExpression, ExpressionSet};
pub use diagnostics::{CollectingReporter, NullReporter, Reporter, TracingReporter};
pub use evaluate::{evaluate_expression, evaluate_row, parse_document};
pub use transformer::XPathTransformer;
