//! Recursive descent parser for `XPath` 1.0.
//!
//! Turns the lexer's token stream into an [`Expr`]. Operator precedence,
//! loosest first:
//!
//! 1. `or`
//! 2. `and`
//! 3. `=`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//! 5. `+`, `-`
//! 6. `*`, `div`, `mod`
//! 7. unary `-`
//! 8. `|`
//!
//! Function calls are checked against the core library here, so an unknown
//! function or a wrong argument count is a compile error.
//!
//! Nesting is bounded by [`MAX_NESTING_DEPTH`]. Parentheses, predicates,
//! function arguments, unary minus and every further operand of an operator
//! chain each add a level, so the depth of the resulting tree, and with it
//! the recursion of both parser and evaluator, stays bounded.

use super::ast::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};
use super::eval::check_call;
use super::lexer::{tokenize, Lexeme, Token};
use super::types::XPathError;

/// Deepest expression tree accepted.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parses an expression string into an AST.
///
/// # Errors
///
/// Returns [`XPathError::Syntax`] if the input is not a valid `XPath` 1.0
/// expression, and [`XPathError::UndefinedFunction`] or
/// [`XPathError::InvalidArgCount`] for calls outside the core library.
///
/// # Examples
///
/// ```
/// use xmlselect::xpath::parser::parse;
///
/// assert!(parse("/books/book[1]/text()").is_ok());
/// assert!(parse("<abracadabra>").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let mut parser = Parser {
        lexemes: tokenize(input)?,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    if parser.lexemes.is_empty() {
        return Err(XPathError::syntax("empty expression", 0));
    }
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.lexemes.get(parser.pos) {
        return Err(XPathError::syntax(
            format!("unexpected '{}' after expression", extra.token),
            extra.position,
        ));
    }
    Ok(expr)
}

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    /// Byte length of the input, used as the position of end-of-input errors.
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.pos).map(|l| &l.token)
    }

    fn position(&self) -> usize {
        self.lexemes.get(self.pos).map_or(self.end, |l| l.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.lexemes.get(self.pos).map(|l| l.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{token}'")))
        }
    }

    /// Records one more level of nesting, failing past the limit.
    fn enter(&mut self) -> Result<(), XPathError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(XPathError::syntax(
                "expression nested too deeply",
                self.position(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn unexpected(&self, wanted: &str) -> XPathError {
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), |t| format!("'{t}'"));
        XPathError::syntax(format!("expected {wanted}, found {found}"), self.position())
    }

    /// Parses a left-associative chain of binary operators.
    fn binary_chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, XPathError>,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, XPathError> {
        let mut left = operand(self)?;
        // Each operator wraps the chain so far, one level deeper.
        let base = self.depth;
        while let Some(op) = self.peek().and_then(operator) {
            self.pos += 1;
            self.enter()?;
            let right = operand(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        self.binary_chain(Self::parse_and, |t| (*t == Token::Or).then_some(BinaryOp::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        self.binary_chain(Self::parse_equality, |t| {
            (*t == Token::And).then_some(BinaryOp::And)
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, XPathError> {
        self.binary_chain(Self::parse_relational, |t| match t {
            Token::Eq => Some(BinaryOp::Eq),
            Token::Neq => Some(BinaryOp::Neq),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, XPathError> {
        self.binary_chain(Self::parse_additive, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::Lte => Some(BinaryOp::Lte),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Gte => Some(BinaryOp::Gte),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, XPathError> {
        self.binary_chain(Self::parse_multiplicative, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, XPathError> {
        self.binary_chain(Self::parse_unary, |t| match t {
            Token::Multiply => Some(BinaryOp::Mul),
            Token::Div => Some(BinaryOp::Div),
            Token::Mod => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Minus) {
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            Ok(Expr::Negate(Box::new(operand)))
        } else {
            self.parse_union()
        }
    }

    fn parse_union(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path()?;
        let base = self.depth;
        while self.eat(&Token::Pipe) {
            self.enter()?;
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    /// `PathExpr ::= LocationPath | FilterExpr (('/' | '//') RelativeLocationPath)?`
    fn parse_path(&mut self) -> Result<Expr, XPathError> {
        let starts_filter = matches!(
            self.peek(),
            Some(
                Token::Variable(_)
                    | Token::LParen
                    | Token::Literal(_)
                    | Token::Number(_)
                    | Token::FunctionName(_)
            )
        );
        if !starts_filter {
            return self.parse_location_path().map(Expr::LocationPath);
        }

        let primary = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        let filter = if predicates.is_empty() {
            primary
        } else {
            Expr::Filter {
                primary: Box::new(primary),
                predicates,
            }
        };

        let mut steps = Vec::new();
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                self.parse_relative_steps(&mut steps)?;
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                self.parse_relative_steps(&mut steps)?;
            }
            _ => return Ok(filter),
        }
        Ok(Expr::Path {
            filter: Box::new(filter),
            steps,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        let position = self.position();
        let token = match self.peek() {
            Some(
                Token::Variable(_)
                | Token::Literal(_)
                | Token::Number(_)
                | Token::LParen
                | Token::FunctionName(_),
            ) => self.next(),
            _ => None,
        };
        match token {
            Some(Token::Variable(name)) => Ok(Expr::Variable(name)),
            Some(Token::Literal(text)) => Ok(Expr::Literal(text)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.leave();
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::FunctionName(name)) => self.parse_call(name, position),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_call(&mut self, name: String, position: usize) -> Result<Expr, XPathError> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                self.enter()?;
                args.push(self.parse_or()?);
                self.leave();
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma)?;
            }
        }

        if let Err(err) = check_call(&name, args.len()) {
            tracing::trace!(function = %name, position, "rejected function call");
            return Err(err);
        }
        Ok(Expr::FunctionCall { name, args })
    }

    /// `LocationPath ::= '/' RelativeLocationPath? | '//' RelativeLocationPath
    ///                 | RelativeLocationPath`
    fn parse_location_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if self.at_step_start() {
                    self.parse_relative_steps(&mut steps)?;
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                self.parse_relative_steps(&mut steps)?;
                true
            }
            _ => {
                self.parse_relative_steps(&mut steps)?;
                false
            }
        };
        Ok(LocationPath { absolute, steps })
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::AxisName(_)
                    | Token::Name(_)
                    | Token::Star
                    | Token::PrefixStar(_)
                    | Token::NodeType(_)
            )
        )
    }

    /// Appends `Step (('/' | '//') Step)*` to `steps`.
    fn parse_relative_steps(&mut self, steps: &mut Vec<Step>) -> Result<(), XPathError> {
        steps.push(self.parse_step()?);
        loop {
            match self.peek() {
                Some(Token::Slash) => self.pos += 1,
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                }
                _ => return Ok(()),
            }
            steps.push(self.parse_step()?);
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::Self_, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }

        let axis = match self.peek() {
            Some(Token::At) => {
                self.pos += 1;
                Axis::Attribute
            }
            Some(&Token::AxisName(axis)) => {
                self.pos += 1;
                self.expect(&Token::ColonColon)?;
                axis
            }
            _ => Axis::Child,
        };
        let node_test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        match self.peek().cloned() {
            Some(Token::Name(name)) => {
                self.pos += 1;
                Ok(NodeTest::Name(name))
            }
            Some(Token::Star) => {
                self.pos += 1;
                Ok(NodeTest::Any)
            }
            Some(Token::PrefixStar(prefix)) => {
                self.pos += 1;
                Ok(NodeTest::AnyWithPrefix(prefix))
            }
            Some(Token::NodeType(kind)) => {
                self.pos += 1;
                self.expect(&Token::LParen)?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => {
                        let target = match self.peek() {
                            Some(Token::Literal(target)) => Some(target.clone()),
                            _ => None,
                        };
                        if target.is_some() {
                            self.pos += 1;
                        }
                        NodeTest::ProcessingInstruction(target)
                    }
                };
                self.expect(&Token::RParen)?;
                Ok(test)
            }
            _ => Err(self.unexpected("a step")),
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            self.enter()?;
            predicates.push(self.parse_or()?);
            self.leave();
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }
}
