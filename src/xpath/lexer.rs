//! `XPath` 1.0 tokenizer.
//!
//! Produces [`Lexeme`]s (a [`Token`] plus its byte offset) from an
//! expression string, applying the disambiguation rules of `XPath` 1.0
//! section 3.7 as it goes:
//!
//! - If there is a preceding token and it is not one of `@`, `::`, `(`,
//!   `[`, `,` or an operator, then `*` is the multiply operator and a name
//!   must be one of `and`, `or`, `mod`, `div`.
//! - A name followed by `(` is a function name, or a node type when it is
//!   `comment`, `text`, `processing-instruction` or `node`.
//! - A name followed by `::` is an axis name.

use std::fmt;

use super::ast::Axis;
use super::types::XPathError;
use crate::parser::input::{is_name_char, is_name_start_char};

const NODE_TYPES: [&str; 4] = ["comment", "text", "processing-instruction", "node"];

/// An `XPath` token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    DotDot,
    At,
    Comma,
    ColonColon,
    Slash,
    DoubleSlash,
    Pipe,
    Plus,
    Minus,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Multiply,
    And,
    Or,
    Mod,
    Div,
    Number(f64),
    Literal(String),
    Variable(String),
    /// A qualified name used as a name test.
    Name(String),
    /// `*` used as a name test.
    Star,
    /// `prefix:*`.
    PrefixStar(String),
    FunctionName(String),
    NodeType(String),
    AxisName(Axis),
}

impl Token {
    /// Tokens after which an operand is expected rather than an operator.
    fn expects_operand_next(&self) -> bool {
        matches!(
            self,
            Self::At
                | Self::ColonColon
                | Self::LParen
                | Self::LBracket
                | Self::Comma
                | Self::And
                | Self::Or
                | Self::Mod
                | Self::Div
                | Self::Multiply
                | Self::Slash
                | Self::DoubleSlash
                | Self::Pipe
                | Self::Plus
                | Self::Minus
                | Self::Eq
                | Self::Neq
                | Self::Lt
                | Self::Lte
                | Self::Gt
                | Self::Gte
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::At => "@",
            Self::Comma => ",",
            Self::ColonColon => "::",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Pipe => "|",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Multiply | Self::Star => "*",
            Self::And => "and",
            Self::Or => "or",
            Self::Mod => "mod",
            Self::Div => "div",
            Self::Number(n) => return write!(f, "{n}"),
            Self::Literal(s) => return write!(f, "\"{s}\""),
            Self::Variable(name) => return write!(f, "${name}"),
            Self::PrefixStar(prefix) => return write!(f, "{prefix}:*"),
            Self::Name(name) | Self::FunctionName(name) | Self::NodeType(name) => name,
            Self::AxisName(axis) => axis.name(),
        };
        f.write_str(text)
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub position: usize,
}

/// Tokenizes an expression.
///
/// # Errors
///
/// Returns [`XPathError::Syntax`] for characters that cannot start a token,
/// unterminated literals, unknown axis names, and names in operator position
/// that are not operator names.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, XPathError> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        lexemes: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.lexemes)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    lexemes: Vec<Lexeme>,
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), XPathError> {
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(ch) = self.peek() else {
                return Ok(());
            };
            let token = match ch {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                '@' => self.single(Token::At),
                ',' => self.single(Token::Comma),
                '|' => self.single(Token::Pipe),
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '=' => self.single(Token::Eq),
                '*' => {
                    let token = if self.operator_expected() {
                        Token::Multiply
                    } else {
                        Token::Star
                    };
                    self.single(token)
                }
                '/' => self.one_or_two('/', Token::Slash, Token::DoubleSlash),
                '<' => self.one_or_two('=', Token::Lt, Token::Lte),
                '>' => self.one_or_two('=', Token::Gt, Token::Gte),
                '!' if self.peek_nth(1) == Some('=') => {
                    self.pos += 2;
                    Token::Neq
                }
                ':' if self.peek_nth(1) == Some(':') => {
                    self.pos += 2;
                    Token::ColonColon
                }
                '.' => match self.peek_nth(1) {
                    Some('.') => {
                        self.pos += 2;
                        Token::DotDot
                    }
                    Some(c) if c.is_ascii_digit() => self.number(),
                    _ => self.single(Token::Dot),
                },
                '0'..='9' => self.number(),
                '"' | '\'' => self.literal(ch)?,
                '$' => {
                    self.pos += 1;
                    if !self.peek().is_some_and(is_ncname_start) {
                        return Err(XPathError::syntax("expected variable name after '$'", start));
                    }
                    Token::Variable(self.qname())
                }
                c if is_ncname_start(c) => self.name(start)?,
                c => {
                    return Err(XPathError::syntax(
                        format!("unexpected character '{c}'"),
                        start,
                    ))
                }
            };
            self.lexemes.push(Lexeme {
                token,
                position: start,
            });
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.peek() {
            self.pos += 1;
        }
    }

    /// True when the previous token leaves us in operator position.
    fn operator_expected(&self) -> bool {
        self.lexemes
            .last()
            .is_some_and(|prev| !prev.token.expects_operand_next())
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn one_or_two(&mut self, second: char, one: Token, two: Token) -> Token {
        if self.peek_nth(1) == Some(second) {
            self.pos += 2;
            two
        } else {
            self.pos += 1;
            one
        }
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        let digits = |lexer: &mut Self| {
            while lexer.peek().is_some_and(|c| c.is_ascii_digit()) {
                lexer.pos += 1;
            }
        };
        digits(self);
        if self.peek() == Some('.') {
            self.pos += 1;
            digits(self);
        }
        // Digits with at most one '.' always parse.
        Token::Number(self.input[start..self.pos].parse().unwrap_or(f64::NAN))
    }

    fn literal(&mut self, quote: char) -> Result<Token, XPathError> {
        let start = self.pos;
        self.pos += 1;
        match self.input[self.pos..].find(quote) {
            Some(len) => {
                let text = self.input[self.pos..self.pos + len].to_string();
                self.pos += len + 1;
                Ok(Token::Literal(text))
            }
            None => Err(XPathError::syntax("unterminated string literal", start)),
        }
    }

    fn ncname(&mut self) -> &str {
        let start = self.pos;
        while let Some(c) = self.peek().filter(|&c| is_ncname_char(c)) {
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    /// Reads `NCName (':' NCName)?`. A `:` followed by `:` is left alone.
    fn qname(&mut self) -> String {
        let mut name = self.ncname().to_string();
        if self.peek() == Some(':') && self.peek_nth(1).is_some_and(is_ncname_start) {
            self.pos += 1;
            name.push(':');
            name.push_str(self.ncname());
        }
        name
    }

    fn name(&mut self, start: usize) -> Result<Token, XPathError> {
        if self.operator_expected() {
            let word = self.ncname();
            return match word {
                "and" => Ok(Token::And),
                "or" => Ok(Token::Or),
                "mod" => Ok(Token::Mod),
                "div" => Ok(Token::Div),
                _ => Err(XPathError::syntax(
                    format!("expected an operator, found '{word}'"),
                    start,
                )),
            };
        }

        let prefix_len = {
            let save = self.pos;
            let len = self.ncname().len();
            self.pos = save;
            len
        };
        if self.input[self.pos + prefix_len..].starts_with(":*") {
            let prefix = self.ncname().to_string();
            self.pos += 2;
            return Ok(Token::PrefixStar(prefix));
        }

        let name = self.qname();
        let rest = self.input[self.pos..].trim_start_matches([' ', '\t', '\r', '\n']);
        if rest.starts_with('(') {
            if NODE_TYPES.contains(&name.as_str()) {
                Ok(Token::NodeType(name))
            } else {
                Ok(Token::FunctionName(name))
            }
        } else if rest.starts_with("::") {
            Axis::from_name(&name)
                .map(Token::AxisName)
                .ok_or_else(|| XPathError::syntax(format!("unknown axis '{name}'"), start))
        } else {
            Ok(Token::Name(name))
        }
    }
}

fn is_ncname_start(c: char) -> bool {
    c != ':' && is_name_start_char(c)
}

fn is_ncname_char(c: char) -> bool {
    c != ':' && is_name_char(c)
}
