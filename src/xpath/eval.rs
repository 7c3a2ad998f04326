//! `XPath` 1.0 expression evaluator.
//!
//! Walks an [`Expr`] produced by [`super::parser::parse`] against a
//! [`Document`] and produces an [`XPathValue`].
//!
//! # Evaluation Context
//!
//! Every expression is evaluated with respect to a context node, a context
//! position, and a context size (section 1). [`XPathContext`] holds the
//! document and the variable bindings; the node, position, and size travel
//! through evaluation as a small copyable focus so predicates never clone
//! the bindings.
//!
//! # Location Paths
//!
//! All 13 axes are supported. Attributes are real arena nodes, so the
//! attribute axis yields attribute nodes that can be serialized, compared,
//! and navigated from like any other node. The namespace axis is always
//! empty: namespace nodes are not materialized.

use std::collections::HashMap;

use super::ast::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};
use super::types::{format_number, parse_number, XPathError, XPathValue};
use crate::parser::input::XML_NAMESPACE;
use crate::tree::{Document, NodeId, NodeKind};

/// Returns the `(min, max)` argument counts of a core library function, or
/// `None` if `name` is not part of the core library. A `max` of `None`
/// means the function is variadic.
pub(crate) fn function_arity(name: &str) -> Option<(usize, Option<usize>)> {
    Some(match name {
        "last" | "position" | "true" | "false" => (0, Some(0)),
        "local-name" | "namespace-uri" | "name" | "string" | "string-length"
        | "normalize-space" | "number" => (0, Some(1)),
        "count" | "id" | "sum" | "boolean" | "not" | "lang" | "floor" | "ceiling" | "round" => {
            (1, Some(1))
        }
        "starts-with" | "contains" | "substring-before" | "substring-after" => (2, Some(2)),
        "substring" => (2, Some(3)),
        "translate" => (3, Some(3)),
        "concat" => (2, None),
        _ => return None,
    })
}

/// Checks a call against [`function_arity`].
pub(crate) fn check_call(name: &str, argc: usize) -> Result<(), XPathError> {
    let Some((min, max)) = function_arity(name) else {
        return Err(XPathError::UndefinedFunction {
            name: name.to_string(),
        });
    };
    if argc >= min && max.map_or(true, |max| argc <= max) {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(XPathError::InvalidArgCount {
        function: name.to_string(),
        expected,
        found: argc,
    })
}

/// Evaluation context for `XPath` 1.0 expressions.
///
/// # Examples
///
/// ```
/// use xmlselect::Document;
/// use xmlselect::xpath::{parser::parse, XPathContext, XPathValue};
///
/// let doc = Document::parse_str("<root><a/><b/></root>").unwrap();
/// let root = doc.root_element().unwrap();
/// let expr = parse("count(*)").unwrap();
/// let ctx = XPathContext::new(&doc, root);
/// assert_eq!(ctx.evaluate(&expr).unwrap(), XPathValue::Number(2.0));
/// ```
pub struct XPathContext<'a> {
    doc: &'a Document,
    context_node: NodeId,
    variables: HashMap<String, XPathValue>,
}

/// The context node, position, and size (1-based) of one evaluation.
#[derive(Debug, Clone, Copy)]
struct Focus {
    node: NodeId,
    position: usize,
    size: usize,
}

impl<'a> XPathContext<'a> {
    /// Creates a context whose node is `context_node`, with position and
    /// size both 1.
    #[must_use]
    pub fn new(doc: &'a Document, context_node: NodeId) -> Self {
        Self {
            doc,
            context_node,
            variables: HashMap::new(),
        }
    }

    /// Binds `$name` to `value`.
    pub fn set_variable(&mut self, name: &str, value: XPathValue) {
        self.variables.insert(name.to_string(), value);
    }

    /// Builder form of [`set_variable`](Self::set_variable).
    #[must_use]
    pub fn with_variable(mut self, name: &str, value: XPathValue) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Evaluates an expression against this context.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError`] for unbound variables, type errors such as a
    /// union of non-node-sets, and calls outside the core library.
    pub fn evaluate(&self, expr: &Expr) -> Result<XPathValue, XPathError> {
        self.eval(
            expr,
            Focus {
                node: self.context_node,
                position: 1,
                size: 1,
            },
        )
    }

    fn eval(&self, expr: &Expr, focus: Focus) -> Result<XPathValue, XPathError> {
        match expr {
            Expr::Number(n) => Ok(XPathValue::Number(*n)),
            Expr::Literal(s) => Ok(XPathValue::String(s.clone())),
            Expr::Variable(name) => {
                self.variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| XPathError::UndefinedVariable {
                        name: name.clone(),
                    })
            }
            Expr::Negate(inner) => {
                let value = self.eval(inner, focus)?;
                Ok(XPathValue::Number(-self.number(&value)))
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, focus),
            Expr::Union(left, right) => {
                let mut nodes = self.eval(left, focus)?.into_node_set()?;
                nodes.extend(self.eval(right, focus)?.into_node_set()?);
                Ok(XPathValue::NodeSet(document_order(nodes)))
            }
            Expr::FunctionCall { name, args } => self.call(name, args, focus),
            Expr::LocationPath(path) => self.eval_location_path(path, focus),
            Expr::Filter {
                primary,
                predicates,
            } => {
                let mut nodes = self.eval(primary, focus)?.into_node_set()?;
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::Path { filter, steps } => {
                let start = self.eval(filter, focus)?.into_node_set()?;
                self.apply_steps(start, steps).map(XPathValue::NodeSet)
            }
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        focus: Focus,
    ) -> Result<XPathValue, XPathError> {
        match op {
            BinaryOp::Or => Ok(XPathValue::Boolean(
                self.eval(left, focus)?.to_boolean() || self.eval(right, focus)?.to_boolean(),
            )),
            BinaryOp::And => Ok(XPathValue::Boolean(
                self.eval(left, focus)?.to_boolean() && self.eval(right, focus)?.to_boolean(),
            )),
            BinaryOp::Eq
            | BinaryOp::Neq
            | BinaryOp::Lt
            | BinaryOp::Lte
            | BinaryOp::Gt
            | BinaryOp::Gte => {
                let lhs = self.eval(left, focus)?;
                let rhs = self.eval(right, focus)?;
                Ok(XPathValue::Boolean(self.compare(op, &lhs, &rhs)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let a = self.number(&self.eval(left, focus)?);
                let b = self.number(&self.eval(right, focus)?);
                Ok(XPathValue::Number(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }))
            }
        }
    }

    // -- Location paths ----------------------------------------------------

    fn eval_location_path(
        &self,
        path: &LocationPath,
        focus: Focus,
    ) -> Result<XPathValue, XPathError> {
        let start = if path.absolute {
            self.doc.root()
        } else {
            focus.node
        };
        self.apply_steps(vec![start], &path.steps)
            .map(XPathValue::NodeSet)
    }

    fn apply_steps(
        &self,
        mut nodes: Vec<NodeId>,
        steps: &[Step],
    ) -> Result<Vec<NodeId>, XPathError> {
        for step in steps {
            let mut next = Vec::new();
            for &node in &nodes {
                next.extend(self.apply_step(node, step)?);
            }
            nodes = document_order(next);
        }
        Ok(nodes)
    }

    /// Selects along one step from a single context node. Predicates see
    /// proximity positions in axis order, so `ancestor::*[1]` is the parent.
    fn apply_step(&self, node: NodeId, step: &Step) -> Result<Vec<NodeId>, XPathError> {
        let mut selected: Vec<NodeId> = self
            .axis_nodes(node, step.axis)
            .into_iter()
            .filter(|&candidate| self.matches(candidate, &step.node_test, step.axis))
            .collect();
        for predicate in &step.predicates {
            selected = self.filter(selected, predicate)?;
        }
        Ok(selected)
    }

    /// The nodes on `axis` from `node`, in axis order: document order for
    /// forward axes, reverse document order for reverse axes.
    fn axis_nodes(&self, node: NodeId, axis: Axis) -> Vec<NodeId> {
        let doc = self.doc;
        let is_attribute = doc.kind(node).is_attribute();
        match axis {
            Axis::Self_ => vec![node],
            Axis::Child => doc.children(node).collect(),
            Axis::Descendant => doc.descendants(node).collect(),
            Axis::DescendantOrSelf => std::iter::once(node).chain(doc.descendants(node)).collect(),
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(node).collect(),
            Axis::AncestorOrSelf => std::iter::once(node).chain(doc.ancestors(node)).collect(),
            Axis::Attribute => doc.attributes(node).to_vec(),
            Axis::Namespace => Vec::new(),
            Axis::FollowingSibling if is_attribute => Vec::new(),
            Axis::PrecedingSibling if is_attribute => Vec::new(),
            Axis::FollowingSibling => {
                std::iter::successors(doc.next_sibling(node), |&s| doc.next_sibling(s)).collect()
            }
            Axis::PrecedingSibling => {
                std::iter::successors(doc.prev_sibling(node), |&s| doc.prev_sibling(s)).collect()
            }
            Axis::Following => self.following(node),
            Axis::Preceding => self.preceding(node),
        }
    }

    fn following(&self, node: NodeId) -> Vec<NodeId> {
        let doc = self.doc;
        let mut out = Vec::new();
        // An attribute precedes its owner's content.
        let start = match doc.parent(node) {
            Some(owner) if doc.kind(node).is_attribute() => {
                out.extend(doc.descendants(owner));
                owner
            }
            _ => node,
        };
        for level in std::iter::once(start).chain(doc.ancestors(start)) {
            let mut sibling = doc.next_sibling(level);
            while let Some(s) = sibling {
                out.push(s);
                out.extend(doc.descendants(s));
                sibling = doc.next_sibling(s);
            }
        }
        out
    }

    fn preceding(&self, node: NodeId) -> Vec<NodeId> {
        let doc = self.doc;
        let start = match doc.parent(node) {
            Some(owner) if doc.kind(node).is_attribute() => owner,
            _ => node,
        };
        let mut out = Vec::new();
        for level in std::iter::once(start).chain(doc.ancestors(start)) {
            let mut sibling = doc.prev_sibling(level);
            while let Some(s) = sibling {
                let subtree: Vec<NodeId> = doc.descendants(s).collect();
                out.extend(subtree.into_iter().rev());
                out.push(s);
                sibling = doc.prev_sibling(s);
            }
        }
        out
    }

    fn matches(&self, node: NodeId, test: &NodeTest, axis: Axis) -> bool {
        let kind = self.doc.kind(node);
        // Attributes for the attribute axis, elements everywhere else.
        let principal = if axis == Axis::Attribute {
            kind.is_attribute()
        } else {
            kind.is_element()
        };
        match test {
            NodeTest::Name(qname) => principal && self.doc.has_qualified_name(node, qname),
            NodeTest::Any => principal,
            NodeTest::AnyWithPrefix(prefix) => {
                principal && self.doc.node_prefix(node) == Some(prefix.as_str())
            }
            NodeTest::Node => true,
            NodeTest::Text => matches!(kind, NodeKind::Text { .. } | NodeKind::CData { .. }),
            NodeTest::Comment => matches!(kind, NodeKind::Comment { .. }),
            NodeTest::ProcessingInstruction(wanted) => match kind {
                NodeKind::ProcessingInstruction { target, .. } => {
                    wanted.as_ref().map_or(true, |w| w == target)
                }
                _ => false,
            },
        }
    }

    /// Keeps the nodes for which `predicate` holds. A numeric predicate
    /// selects by position.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn filter(&self, nodes: Vec<NodeId>, predicate: &Expr) -> Result<Vec<NodeId>, XPathError> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (index, node) in nodes.into_iter().enumerate() {
            let focus = Focus {
                node,
                position: index + 1,
                size,
            };
            let keep = match self.eval(predicate, focus)? {
                XPathValue::Number(n) => n == focus.position as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    // -- Conversions -------------------------------------------------------

    fn string(&self, value: &XPathValue) -> String {
        match value {
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|&n| self.doc.string_value(n))
                .unwrap_or_default(),
            XPathValue::String(s) => s.clone(),
            XPathValue::Boolean(b) => b.to_string(),
            XPathValue::Number(n) => format_number(*n),
        }
    }

    fn number(&self, value: &XPathValue) -> f64 {
        match value {
            XPathValue::Number(n) => *n,
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            XPathValue::String(s) => parse_number(s),
            XPathValue::NodeSet(_) => parse_number(&self.string(value)),
        }
    }

    /// Comparison with node-set existential semantics (section 3.4).
    fn compare(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        let string_of = |n: &NodeId| XPathValue::String(self.doc.string_value(*n));
        match (lhs, rhs) {
            (XPathValue::NodeSet(left), XPathValue::NodeSet(right)) => {
                let right: Vec<XPathValue> = right.iter().map(string_of).collect();
                left.iter().any(|l| {
                    let l = string_of(l);
                    right.iter().any(|r| self.compare_scalars(op, &l, r))
                })
            }
            (XPathValue::NodeSet(nodes), XPathValue::Boolean(_)) => {
                self.compare_scalars(op, &XPathValue::Boolean(!nodes.is_empty()), rhs)
            }
            (XPathValue::Boolean(_), XPathValue::NodeSet(nodes)) => {
                self.compare_scalars(op, lhs, &XPathValue::Boolean(!nodes.is_empty()))
            }
            (XPathValue::NodeSet(nodes), scalar) => nodes
                .iter()
                .any(|n| self.compare_scalars(op, &string_of(n), scalar)),
            (scalar, XPathValue::NodeSet(nodes)) => nodes
                .iter()
                .any(|n| self.compare_scalars(op, scalar, &string_of(n))),
            _ => self.compare_scalars(op, lhs, rhs),
        }
    }

    #[allow(clippy::float_cmp)]
    fn compare_scalars(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        if matches!(op, BinaryOp::Eq | BinaryOp::Neq) {
            let equal = match (lhs, rhs) {
                (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
                    lhs.to_boolean() == rhs.to_boolean()
                }
                (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
                    self.number(lhs) == self.number(rhs)
                }
                _ => self.string(lhs) == self.string(rhs),
            };
            return equal == (op == BinaryOp::Eq);
        }
        let (a, b) = (self.number(lhs), self.number(rhs));
        match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Lte => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        }
    }

    // -- Core function library ---------------------------------------------

    #[allow(clippy::cast_precision_loss)]
    fn call(&self, name: &str, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        check_call(name, args.len())?;
        let value = match (name, args) {
            ("last", []) => XPathValue::Number(focus.size as f64),
            ("position", []) => XPathValue::Number(focus.position as f64),
            ("count", [nodes]) => {
                XPathValue::Number(self.eval(nodes, focus)?.into_node_set()?.len() as f64)
            }
            ("id", [arg]) => XPathValue::NodeSet(self.id(arg, focus)?),
            ("local-name", _) => {
                let node = self.optional_node(args, focus)?;
                let local = node.and_then(|n| self.doc.local_name(n)).unwrap_or_default();
                XPathValue::String(local.to_string())
            }
            ("namespace-uri", _) => {
                let node = self.optional_node(args, focus)?;
                XPathValue::String(node.and_then(|n| self.namespace_uri(n)).unwrap_or_default())
            }
            ("name", _) => {
                let node = self.optional_node(args, focus)?;
                XPathValue::String(node.and_then(|n| self.doc.node_name(n)).unwrap_or_default())
            }

            ("string", _) => XPathValue::String(self.optional_string(args, focus)?),
            ("concat", _) => {
                let mut out = String::new();
                for arg in args {
                    out.push_str(&self.string_arg(arg, focus)?);
                }
                XPathValue::String(out)
            }
            ("starts-with", [s, prefix]) => XPathValue::Boolean(
                self.string_arg(s, focus)?
                    .starts_with(&self.string_arg(prefix, focus)?),
            ),
            ("contains", [s, needle]) => XPathValue::Boolean(
                self.string_arg(s, focus)?
                    .contains(&self.string_arg(needle, focus)?),
            ),
            ("substring-before", [s, needle]) => {
                let s = self.string_arg(s, focus)?;
                let needle = self.string_arg(needle, focus)?;
                XPathValue::String(
                    s.split_once(needle.as_str())
                        .map(|(before, _)| before.to_string())
                        .unwrap_or_default(),
                )
            }
            ("substring-after", [s, needle]) => {
                let s = self.string_arg(s, focus)?;
                let needle = self.string_arg(needle, focus)?;
                XPathValue::String(
                    s.split_once(needle.as_str())
                        .map(|(_, after)| after.to_string())
                        .unwrap_or_default(),
                )
            }
            ("substring", [s, start, rest @ ..]) => {
                let s = self.string_arg(s, focus)?;
                let start = self.number_arg(start, focus)?;
                let length = match rest.first() {
                    Some(length) => Some(self.number_arg(length, focus)?),
                    None => None,
                };
                XPathValue::String(substring(&s, start, length))
            }
            ("string-length", _) => {
                XPathValue::Number(self.optional_string(args, focus)?.chars().count() as f64)
            }
            ("normalize-space", _) => {
                let s = self.optional_string(args, focus)?;
                let words: Vec<&str> = s.split(is_xml_space).filter(|w| !w.is_empty()).collect();
                XPathValue::String(words.join(" "))
            }
            ("translate", [s, from, to]) => {
                let s = self.string_arg(s, focus)?;
                let from: Vec<char> = self.string_arg(from, focus)?.chars().collect();
                let to: Vec<char> = self.string_arg(to, focus)?.chars().collect();
                XPathValue::String(
                    s.chars()
                        .filter_map(|c| match from.iter().position(|&f| f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }

            ("boolean", [arg]) => XPathValue::Boolean(self.eval(arg, focus)?.to_boolean()),
            ("not", [arg]) => XPathValue::Boolean(!self.eval(arg, focus)?.to_boolean()),
            ("true", []) => XPathValue::Boolean(true),
            ("false", []) => XPathValue::Boolean(false),
            ("lang", [arg]) => {
                let wanted = self.string_arg(arg, focus)?;
                XPathValue::Boolean(self.lang(focus.node, &wanted))
            }

            ("number", []) => XPathValue::Number(parse_number(&self.doc.string_value(focus.node))),
            ("number", [arg]) => XPathValue::Number(self.number_arg(arg, focus)?),
            ("sum", [nodes]) => XPathValue::Number(
                self.eval(nodes, focus)?
                    .into_node_set()?
                    .into_iter()
                    .map(|n| parse_number(&self.doc.string_value(n)))
                    .sum(),
            ),
            ("floor", [arg]) => XPathValue::Number(self.number_arg(arg, focus)?.floor()),
            ("ceiling", [arg]) => XPathValue::Number(self.number_arg(arg, focus)?.ceil()),
            ("round", [arg]) => XPathValue::Number(round(self.number_arg(arg, focus)?)),

            _ => {
                return Err(XPathError::UndefinedFunction {
                    name: name.to_string(),
                })
            }
        };
        Ok(value)
    }

    fn string_arg(&self, arg: &Expr, focus: Focus) -> Result<String, XPathError> {
        Ok(self.string(&self.eval(arg, focus)?))
    }

    fn number_arg(&self, arg: &Expr, focus: Focus) -> Result<f64, XPathError> {
        Ok(self.number(&self.eval(arg, focus)?))
    }

    /// The string of the only argument, or of the context node if there is
    /// none.
    fn optional_string(&self, args: &[Expr], focus: Focus) -> Result<String, XPathError> {
        match args.first() {
            Some(arg) => self.string_arg(arg, focus),
            None => Ok(self.doc.string_value(focus.node)),
        }
    }

    /// The first node of the only argument, or the context node if there is
    /// none. An empty node-set yields `None`.
    fn optional_node(&self, args: &[Expr], focus: Focus) -> Result<Option<NodeId>, XPathError> {
        match args.first() {
            Some(arg) => Ok(self.eval(arg, focus)?.into_node_set()?.first().copied()),
            None => Ok(Some(focus.node)),
        }
    }

    fn namespace_uri(&self, node: NodeId) -> Option<String> {
        let doc = self.doc;
        match doc.kind(node) {
            NodeKind::Element { .. } => doc.node_namespace(node).map(str::to_string),
            // Unprefixed attributes are in no namespace.
            NodeKind::Attribute {
                prefix: Some(prefix),
                ..
            } => {
                if prefix == "xml" {
                    return Some(XML_NAMESPACE.to_string());
                }
                let declaration = format!("xmlns:{prefix}");
                doc.ancestors(node)
                    .find_map(|e| doc.attribute(e, &declaration))
                    .filter(|uri| !uri.is_empty())
                    .map(str::to_string)
            }
            _ => None,
        }
    }

    /// `lang()`: the nearest `xml:lang` on the context node or an ancestor
    /// matches `wanted` ignoring case, or starts with it followed by `-`.
    fn lang(&self, node: NodeId, wanted: &str) -> bool {
        let doc = self.doc;
        let Some(lang) = std::iter::once(node)
            .chain(doc.ancestors(node))
            .find_map(|n| doc.attribute(n, "xml:lang"))
        else {
            return false;
        };
        let lang = lang.to_ascii_lowercase();
        let wanted = wanted.to_ascii_lowercase();
        lang == wanted
            || lang
                .strip_prefix(wanted.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    }

    /// `id()`: elements whose `xml:id` equals one of the whitespace
    /// separated tokens. No DTD is read, so `xml:id` is the only ID
    /// attribute.
    fn id(&self, arg: &Expr, focus: Focus) -> Result<Vec<NodeId>, XPathError> {
        let doc = self.doc;
        let text = match self.eval(arg, focus)? {
            XPathValue::NodeSet(nodes) => nodes
                .iter()
                .map(|&n| doc.string_value(n))
                .collect::<Vec<_>>()
                .join(" "),
            other => self.string(&other),
        };
        let tokens: Vec<&str> = text.split(is_xml_space).filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        Ok(doc
            .descendants(doc.root())
            .filter(|&n| {
                doc.attribute(n, "xml:id")
                    .is_some_and(|id| tokens.contains(&id))
            })
            .collect())
    }
}

/// Sorts into document order and drops duplicates. Node ids are allocated
/// in document order, attributes right after their owner element.
fn document_order(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// `round()`: halves go towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

/// `substring()`: the characters at 1-based positions `p` with
/// `round(start) <= p < round(start) + round(length)`. NaN and infinite
/// bounds fall out of the comparisons.
#[allow(clippy::cast_precision_loss)]
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = round(start);
    let end = length.map_or(f64::INFINITY, |l| first + round(l));
    s.chars()
        .enumerate()
        .filter(|&(i, _)| {
            let position = (i + 1) as f64;
            position >= first && position < end
        })
        .map(|(_, c)| c)
        .collect()
}
