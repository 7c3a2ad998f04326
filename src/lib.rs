//! # xmlselect
//!
//! Select values from XML text fields using compiled `XPath` 1.0
//! expressions.
//!
//! A configured list of expressions is compiled once. Each input value is
//! then parsed into its own document and every expression is evaluated
//! against it, giving one cell per expression. A cell holds one string per
//! selected node: raw text for text and attribute nodes, markup without an
//! XML declaration for elements. Bad expressions and bad documents never
//! fail a row; they empty the affected cells and produce a diagnostic.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use xmlselect::config::ExtractConfig;
//! use xmlselect::extract::{TracingReporter, XPathTransformer};
//!
//! let config = ExtractConfig::new("xml value")
//!     .expression("/books/book[1]/text()")
//!     .expression("/books/book/text()");
//! let transformer = XPathTransformer::new(&config, Arc::new(TracingReporter));
//!
//! let row = transformer.transform(Some(
//!     "<books><book>Robinson Crusoe</book><book>Gulliver's Travels</book></books>",
//! ));
//! assert_eq!(row[0], vec!["Robinson Crusoe"]);
//! assert_eq!(row[1], vec!["Robinson Crusoe", "Gulliver's Travels"]);
//! assert_eq!(
//!     transformer.output_columns()[0].name,
//!     "xml value (/books/book[1]/text())"
//! );
//! ```
//!
//! ## Modules
//!
//! - [`tree`]: the parsed document model.
//! - [`parser`]: well-formed XML 1.0 parsing.
//! - [`serial`]: node serialization.
//! - [`xpath`]: the `XPath` 1.0 engine.
//! - [`extract`]: the transformer.
//! - [`config`]: transformer configuration.

pub mod config;
pub mod error;
pub mod extract;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod xpath;

// Re-export primary types at the crate root for convenience.
pub use error::ParseError;
pub use extract::XPathTransformer;
pub use tree::{Document, NodeId, NodeKind};
