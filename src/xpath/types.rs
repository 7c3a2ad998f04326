//! `XPath` 1.0 values and errors.
//!
//! The four data types of the `XPath` 1.0 data model and the conversions
//! between them (sections 4.2 to 4.4). Node-set conversions need the
//! document to compute string-values, so they live on the evaluator; the
//! methods here cover the scalar cases.

use std::fmt;

use thiserror::Error;

use crate::tree::NodeId;

/// An `XPath` 1.0 value.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue {
    Boolean(bool),
    Number(f64),
    String(String),
    /// Nodes in document order, without duplicates.
    NodeSet(Vec<NodeId>),
}

impl XPathValue {
    /// Boolean conversion (section 4.3).
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// The name of this value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NodeSet(_) => "node-set",
        }
    }

    /// Unwraps a node-set, or reports the actual type.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError::TypeError`] for any scalar value.
    pub fn into_node_set(self) -> Result<Vec<NodeId>, XPathError> {
        match self {
            Self::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError {
                expected: "node-set",
                found: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for XPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::NodeSet(nodes) => write!(f, "node-set({})", nodes.len()),
        }
    }
}

/// Number to string conversion (section 4.2).
///
/// Integers print without a decimal point, negative zero prints as `0`,
/// and no exponent notation is ever produced.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        // f64's Display never uses exponent notation and omits ".0".
        format!("{n}")
    }
}

/// String to number conversion (section 4.4).
///
/// Accepts optional surrounding whitespace, an optional minus sign, and
/// digits with an optional decimal point. Anything else is NaN.
#[must_use]
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut parts = unsigned.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    let digits_ok = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let valid = digits_ok(whole)
        && fraction.map_or(true, digits_ok)
        && (!whole.is_empty() || fraction.is_some_and(|f| !f.is_empty()));
    if !valid {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// An error raised while compiling or evaluating an `XPath` expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// The expression text is not valid `XPath` 1.0.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        message: String,
        /// 0-based byte offset into the expression.
        position: usize,
    },

    /// An operand had the wrong type, e.g. a union of numbers.
    #[error("type error: expected {expected}, found {found}")]
    TypeError {
        expected: &'static str,
        found: &'static str,
    },

    /// A `$name` reference with no binding.
    #[error("undefined variable: ${name}")]
    UndefinedVariable { name: String },

    /// A call to a function outside the core library.
    #[error("undefined function: {name}()")]
    UndefinedFunction { name: String },

    /// A core function called with the wrong number of arguments.
    #[error("function {function}() expects {expected} argument(s), found {found}")]
    InvalidArgCount {
        function: String,
        expected: String,
        found: usize,
    },
}

impl XPathError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_conversion() {
        assert!(!XPathValue::Number(0.0).to_boolean());
        assert!(!XPathValue::Number(f64::NAN).to_boolean());
        assert!(XPathValue::Number(-2.5).to_boolean());
        assert!(!XPathValue::String(String::new()).to_boolean());
        assert!(XPathValue::String("false".to_string()).to_boolean());
        assert!(!XPathValue::NodeSet(Vec::new()).to_boolean());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-12.25), "-12.25");
        assert_eq!(format_number(1e21), "1000000000000000000000");
        assert_eq!(format_number(0.000_001), "0.000001");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("7."), 7.0);
        for bad in ["", " ", "1e3", "+1", "inf", "NaN", "0x10", "1.2.3", "-", "."] {
            assert!(parse_number(bad).is_nan(), "{bad:?} should be NaN");
        }
    }

    #[test]
    fn test_into_node_set_type_error() {
        let err = XPathValue::Number(1.0).into_node_set().unwrap_err();
        assert_eq!(
            err.to_string(),
            "type error: expected node-set, found number"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            XPathError::syntax("expected expression", 0).to_string(),
            "syntax error at position 0: expected expression"
        );
        assert_eq!(
            XPathError::UndefinedFunction {
                name: "upper-case".to_string()
            }
            .to_string(),
            "undefined function: upper-case()"
        );
    }
}
