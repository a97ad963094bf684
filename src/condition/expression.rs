//! Boolean expressions over attribute values.
//!
//! Supports expressions like:
//! - `age > 30`
//! - `city == 'Bonn'`
//! - `age > 30 AND city != 'Bonn'`
//! - `(age >= 18) OR NOT (income < 1000)`
//! - `income IS MISSING`, `income IS NOT NULL`
//! - `` `body mass` <= 25.5 `` (backquotes for names with spaces)
//!
//! Attribute names are resolved when the condition is built. Comparing a
//! nominal attribute with a number (or a numeric one with a string) is an
//! evaluation error for every row that reaches the comparison; comparisons
//! involving a missing value are false.

use std::collections::HashMap;

use crate::attribute::Attribute;
use crate::error::{Error, Result};
use crate::example::Example;
use crate::example_set::ExampleSet;

use super::Condition;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        attribute: String,
        op: CompareOp,
        value: Literal,
    },
    IsMissing(String),
    IsNotMissing(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Attribute names referenced anywhere in the tree, sorted and unique.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names.sort_unstable();
        names.dedup();
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Compare { attribute, .. } | Expr::IsMissing(attribute) | Expr::IsNotMissing(attribute) => {
                names.push(attribute)
            }
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Expr::Not(inner) => inner.collect_names(names),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn apply<T: PartialOrd + ?Sized>(self, a: &T, b: &T) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
    Op(CompareOp),
    And,
    Or,
    Not,
    Is,
    LParen,
    RParen,
}

/// Split `input` into tokens.
fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let next_is = |pos: usize, c: char| chars.get(pos) == Some(&c);

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        let (token, width) = match c {
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '=' if next_is(pos + 1, '=') => (Token::Op(CompareOp::Eq), 2),
            '=' => (Token::Op(CompareOp::Eq), 1),
            '!' if next_is(pos + 1, '=') => (Token::Op(CompareOp::Ne), 2),
            '!' => (Token::Not, 1),
            '<' if next_is(pos + 1, '=') => (Token::Op(CompareOp::Le), 2),
            '<' if next_is(pos + 1, '>') => (Token::Op(CompareOp::Ne), 2),
            '<' => (Token::Op(CompareOp::Lt), 1),
            '>' if next_is(pos + 1, '=') => (Token::Op(CompareOp::Ge), 2),
            '>' => (Token::Op(CompareOp::Gt), 1),
            '&' if next_is(pos + 1, '&') => (Token::And, 2),
            '|' if next_is(pos + 1, '|') => (Token::Or, 2),
            '\'' | '"' | '`' => {
                let (text, width) = read_quoted(&chars[pos..], c)?;
                let token = if c == '`' {
                    Token::Ident(text)
                } else {
                    Token::Text(text)
                };
                (token, width)
            }
            _ if c.is_ascii_digit()
                || (matches!(c, '-' | '.')
                    && chars.get(pos + 1).is_some_and(|n| n.is_ascii_digit() || *n == '.')) =>
            {
                let width = chars[pos..]
                    .iter()
                    .enumerate()
                    .take_while(|&(i, ch)| {
                        ch.is_ascii_digit() || *ch == '.' || (i == 0 && *ch == '-')
                    })
                    .count();
                let text: String = chars[pos..pos + width].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| Error::invalid_condition(format!("bad number '{text}'")))?;
                (Token::Number(number), width)
            }
            _ if c.is_alphabetic() || c == '_' => {
                let width = chars[pos..]
                    .iter()
                    .take_while(|ch| ch.is_alphanumeric() || **ch == '_')
                    .count();
                let word: String = chars[pos..pos + width].iter().collect();
                let token = match word.to_uppercase().as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    "IS" => Token::Is,
                    "NULL" | "MISSING" => Token::Null,
                    "TRUE" => Token::Bool(true),
                    "FALSE" => Token::Bool(false),
                    _ => Token::Ident(word),
                };
                (token, width)
            }
            _ => {
                return Err(Error::invalid_condition(format!(
                    "unexpected character '{c}' at position {pos}"
                )))
            }
        };
        tokens.push(token);
        pos += width;
    }
    Ok(tokens)
}

/// Read a quoted run starting at `chars[0] == quote`; returns the text and
/// the number of characters consumed. Backslash escapes the next character.
fn read_quoted(chars: &[char], quote: char) -> Result<(String, usize)> {
    let mut text = String::new();
    let mut pos = 1;
    while let Some(&c) = chars.get(pos) {
        pos += 1;
        match c {
            _ if c == quote => return Ok((text, pos)),
            '\\' => {
                if let Some(&escaped) = chars.get(pos) {
                    pos += 1;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
            }
            _ => text.push(c),
        }
    }
    Err(Error::invalid_condition("unterminated quoted string"))
}

/// Recursive-descent parser: OR < AND < NOT < comparison.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next(&mut self, what: &str) -> Result<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| Error::invalid_condition(format!("expected {what}, got end of input")))?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let attribute = match self.next("attribute name or '('")? {
            Token::LParen => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(Error::invalid_condition("expected ')'"));
                }
                return Ok(inner);
            }
            Token::Ident(name) => name,
            other => {
                return Err(Error::invalid_condition(format!(
                    "expected attribute name, got {other:?}"
                )))
            }
        };

        if self.eat(&Token::Is) {
            let negated = self.eat(&Token::Not);
            if !self.eat(&Token::Null) {
                return Err(Error::invalid_condition("expected MISSING or NULL after IS"));
            }
            return Ok(if negated {
                Expr::IsNotMissing(attribute)
            } else {
                Expr::IsMissing(attribute)
            });
        }

        let op = match self.next("comparison operator")? {
            Token::Op(op) => op,
            other => {
                return Err(Error::invalid_condition(format!(
                    "expected comparison operator, got {other:?}"
                )))
            }
        };
        let value = match self.next("literal value")? {
            Token::Number(n) => Literal::Number(n),
            Token::Text(s) => Literal::Text(s),
            Token::Bool(b) => Literal::Bool(b),
            Token::Null => Literal::Null,
            other => {
                return Err(Error::invalid_condition(format!(
                    "expected literal value, got {other:?}"
                )))
            }
        };
        Ok(Expr::Compare {
            attribute,
            op,
            value,
        })
    }
}

/// Parse an expression string.
pub fn parse_expression(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(Error::invalid_condition("empty expression"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(Error::invalid_condition(format!(
            "unexpected token after expression: {token:?}"
        )));
    }
    Ok(expr)
}

/// A condition backed by a parsed [`Expr`].
#[derive(Debug, Clone)]
pub struct ExpressionCondition {
    expr: Expr,
    attributes: HashMap<String, Attribute>,
}

impl ExpressionCondition {
    /// Parse `expression` and resolve its attributes in `set`.
    pub fn new(set: &dyn ExampleSet, expression: &str) -> Result<Self> {
        let expr = parse_expression(expression)?;
        let attributes = expr
            .attribute_names()
            .into_iter()
            .map(|name| {
                set.attributes()
                    .get(name)
                    .map(|a| (name.to_string(), a.clone()))
                    .ok_or_else(|| Error::attribute_not_found(name))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(ExpressionCondition { expr, attributes })
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    fn attribute(&self, name: &str) -> Result<&Attribute> {
        self.attributes
            .get(name)
            .ok_or_else(|| Error::attribute_not_found(name))
    }

    fn eval(&self, expr: &Expr, example: &Example<'_>) -> Result<bool> {
        match expr {
            Expr::Compare {
                attribute,
                op,
                value,
            } => self.compare(self.attribute(attribute)?, *op, value, example),
            Expr::IsMissing(attribute) => Ok(example.is_missing(self.attribute(attribute)?)),
            Expr::IsNotMissing(attribute) => Ok(!example.is_missing(self.attribute(attribute)?)),
            Expr::And(left, right) => Ok(self.eval(left, example)? && self.eval(right, example)?),
            Expr::Or(left, right) => Ok(self.eval(left, example)? || self.eval(right, example)?),
            Expr::Not(inner) => Ok(!self.eval(inner, example)?),
        }
    }

    fn compare(
        &self,
        attribute: &Attribute,
        op: CompareOp,
        literal: &Literal,
        example: &Example<'_>,
    ) -> Result<bool> {
        let value = example.value(attribute);
        if value.is_nan() || *literal == Literal::Null {
            return Ok(false);
        }
        match (attribute.is_nominal(), literal) {
            (true, Literal::Text(expected)) => Ok(example
                .nominal_value(attribute)
                .is_some_and(|actual| op.apply(actual, expected.as_str()))),
            (false, Literal::Number(expected)) => Ok(op.apply(&value, expected)),
            (_, other) => Err(Error::evaluation(
                example.data_row().index(),
                format!(
                    "cannot compare {} attribute '{}' with {:?}",
                    attribute.value_type(),
                    attribute.name(),
                    other
                ),
            )),
        }
    }
}

impl Condition for ExpressionCondition {
    fn condition_ok(&self, example: &Example<'_>) -> Result<bool> {
        self.eval(&self.expr, example)
    }
}
