//! Abstract syntax tree for compiled `XPath` 1.0 expressions.
//!
//! The tree follows the `XPath` 1.0 grammar
//! (<https://www.w3.org/TR/xpath-10/#section-Expressions>). Abbreviations are
//! expanded by the parser: `.` becomes `self::node()`, `..` becomes
//! `parent::node()`, `@x` becomes `attribute::x`, and `//` becomes
//! `/descendant-or-self::node()/`.

use std::fmt;

/// An `XPath` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal such as `2` or `.5`.
    Number(f64),
    /// A string literal, without its quotes.
    Literal(String),
    /// A variable reference, `$name`, stored without the `$`.
    Variable(String),
    /// Unary minus.
    Negate(Box<Expr>),
    /// A binary operator application.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `left | right`.
    Union(Box<Expr>, Box<Expr>),
    /// A core library function call.
    FunctionCall { name: String, args: Vec<Expr> },
    /// A location path such as `/books/book[1]` or `@id`.
    LocationPath(LocationPath),
    /// A primary expression followed by predicates, e.g. `(//a)[2]`.
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
    },
    /// A filter expression continued by a relative path, e.g. `$x/name`.
    Path { filter: Box<Expr>, steps: Vec<Step> },
}

/// A location path: an optional leading `/` and a list of steps.
///
/// An absolute path with no steps is the bare `/`, selecting the root.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

/// Binary operators, loosest-binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// The operator as written in an expression.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One step of a location path: `axis::node-test[predicate]*`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    /// A step with no predicates.
    #[must_use]
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// The thirteen `XPath` 1.0 axes (section 2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    Self_,
}

impl Axis {
    /// Looks up an axis by its `XPath` name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "attribute" => Self::Attribute,
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "following" => Self::Following,
            "following-sibling" => Self::FollowingSibling,
            "namespace" => Self::Namespace,
            "parent" => Self::Parent,
            "preceding" => Self::Preceding,
            "preceding-sibling" => Self::PrecedingSibling,
            "self" => Self::Self_,
            _ => return None,
        })
    }

    /// The axis name as written in an expression.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ancestor => "ancestor",
            Self::AncestorOrSelf => "ancestor-or-self",
            Self::Attribute => "attribute",
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::DescendantOrSelf => "descendant-or-self",
            Self::Following => "following",
            Self::FollowingSibling => "following-sibling",
            Self::Namespace => "namespace",
            Self::Parent => "parent",
            Self::Preceding => "preceding",
            Self::PrecedingSibling => "preceding-sibling",
            Self::Self_ => "self",
        }
    }

    /// Reverse axes number their proximity positions backwards from the
    /// context node (section 2.4).
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Ancestor | Self::AncestorOrSelf | Self::Preceding | Self::PrecedingSibling
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node test (section 2.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A qualified name, matched against the name as written in the document.
    Name(String),
    /// `*`: any node of the axis' principal type.
    Any,
    /// `prefix:*`.
    AnyWithPrefix(String),
    /// `node()`.
    Node,
    /// `text()`, which also matches CDATA sections.
    Text,
    /// `comment()`.
    Comment,
    /// `processing-instruction()` with an optional target literal.
    ProcessingInstruction(Option<String>),
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Any => f.write_str("*"),
            Self::AnyWithPrefix(prefix) => write!(f, "{prefix}:*"),
            Self::Node => f.write_str("node()"),
            Self::Text => f.write_str("text()"),
            Self::Comment => f.write_str("comment()"),
            Self::ProcessingInstruction(None) => f.write_str("processing-instruction()"),
            Self::ProcessingInstruction(Some(target)) => {
                write!(f, "processing-instruction('{target}')")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_names_roundtrip() {
        for axis in [
            Axis::Ancestor,
            Axis::AncestorOrSelf,
            Axis::Attribute,
            Axis::Child,
            Axis::Descendant,
            Axis::DescendantOrSelf,
            Axis::Following,
            Axis::FollowingSibling,
            Axis::Namespace,
            Axis::Parent,
            Axis::Preceding,
            Axis::PrecedingSibling,
            Axis::Self_,
        ] {
            assert_eq!(Axis::from_name(axis.name()), Some(axis));
        }
        assert_eq!(Axis::from_name("children"), None);
    }

    #[test]
    fn test_reverse_axes() {
        assert!(Axis::Ancestor.is_reverse());
        assert!(Axis::PrecedingSibling.is_reverse());
        assert!(!Axis::Child.is_reverse());
        assert!(!Axis::FollowingSibling.is_reverse());
    }

    #[test]
    fn test_node_test_display() {
        assert_eq!(NodeTest::Name("dc:title".to_string()).to_string(), "dc:title");
        assert_eq!(NodeTest::AnyWithPrefix("atom".to_string()).to_string(), "atom:*");
        assert_eq!(
            NodeTest::ProcessingInstruction(Some("style".to_string())).to_string(),
            "processing-instruction('style')"
        );
    }

    #[test]
    fn test_binary_op_symbols() {
        assert_eq!(BinaryOp::Neq.to_string(), "!=");
        assert_eq!(BinaryOp::Div.to_string(), "div");
    }
}
