//! Address expressions
//!
//! An address is either a number or an arithmetic expression over named base
//! addresses, such as `"libc + 0x3c5620"` or `"heap + 0x10 * 8"`. Hexadecimal
//! literals are substituted with their decimal value first; the result is parsed
//! with `+ - * /` and parentheses, binding identifiers to the supplied bases.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{Error, Result};

/// Base addresses keyed by name (`heap`, `libc`, ...)
pub type Bases = BTreeMap<String, u64>;

static HEX_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0[xX][0-9a-fA-F]+").expect("valid hex literal regex"));

/// Where to read or write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Absolute(u64),
    Expr(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Absolute(addr) => write!(f, "{:#x}", addr),
            Address::Expr(expr) => f.write_str(expr),
        }
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Address::Absolute(addr)
    }
}

impl From<usize> for Address {
    fn from(addr: usize) -> Self {
        Address::Absolute(addr as u64)
    }
}

impl From<&str> for Address {
    fn from(expr: &str) -> Self {
        Address::Expr(expr.to_string())
    }
}

impl From<String> for Address {
    fn from(expr: String) -> Self {
        Address::Expr(expr)
    }
}

/// Numbers are returned unchanged; expressions are evaluated against `bases`
pub fn resolve(addr: &Address, bases: &Bases) -> Result<u64> {
    match addr {
        Address::Absolute(addr) => Ok(*addr),
        Address::Expr(expr) => evaluate(expr, bases),
    }
}

/// Evaluate an address expression.
///
/// Unknown names are an [`Error::Eval`], never zero. Malformed input is an
/// [`Error::Parse`].
///
/// ```
/// use memio::{evaluate, Bases};
///
/// let bases = Bases::from([("heap".to_string(), 0xde00), ("pp".to_string(), 8)]);
/// assert_eq!(evaluate("heap + 0x10 * pp", &bases).unwrap(), 0xde80);
/// ```
pub fn evaluate(expr: &str, bases: &Bases) -> Result<u64> {
    let substituted = substitute_hex(expr)?;
    let tokens = tokenize(&substituted).map_err(|reason| parse_error(expr, reason))?;
    let ast = Parser::new(&tokens)
        .parse()
        .map_err(|reason| parse_error(expr, reason))?;

    let value = ast.eval(bases).map_err(|reason| Error::Eval {
        expr: expr.to_string(),
        reason,
    })?;
    u64::try_from(value).map_err(|_| Error::Eval {
        expr: expr.to_string(),
        reason: format!("result {} is not a valid address", value),
    })
}

fn parse_error(expr: &str, reason: String) -> Error {
    Error::Parse {
        expr: expr.to_string(),
        reason,
    }
}

fn substitute_hex(expr: &str) -> Result<String> {
    let mut failure = None;
    let substituted = HEX_LITERAL.replace_all(expr, |caps: &Captures| {
        match u64::from_str_radix(&caps[0][2..], 16) {
            Ok(value) => value.to_string(),
            Err(_) => {
                failure = Some(caps[0].to_string());
                String::new()
            }
        }
    });
    if let Some(literal) = failure {
        return Err(parse_error(expr, format!("literal {} is out of range", literal)));
    }
    Ok(substituted.into_owned())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(u64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            c if c.is_ascii_digit() => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !c.is_ascii_alphanumeric() {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let literal = &input[start..end];
                let number = literal
                    .parse::<u64>()
                    .map_err(|_| format!("invalid number `{}`", literal))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Ident(input[start..end].to_string()));
            }
            other => return Err(format!("unexpected character `{}` at {}", other, start)),
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(u64),
    Ident(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn eval(&self, bases: &Bases) -> std::result::Result<i128, String> {
        let overflow = || "arithmetic overflow".to_string();
        match self {
            Expr::Number(n) => Ok(*n as i128),
            Expr::Ident(name) => bases
                .get(name)
                .map(|&base| base as i128)
                .ok_or_else(|| format!("undefined name `{}`", name)),
            Expr::Neg(inner) => inner.eval(bases)?.checked_neg().ok_or_else(overflow),
            Expr::Binary { op, left, right } => {
                let l = left.eval(bases)?;
                let r = right.eval(bases)?;
                match op {
                    BinOp::Add => l.checked_add(r).ok_or_else(overflow),
                    BinOp::Sub => l.checked_sub(r).ok_or_else(overflow),
                    BinOp::Mul => l.checked_mul(r).ok_or_else(overflow),
                    BinOp::Div if r == 0 => Err("division by zero".to_string()),
                    BinOp::Div => l.checked_div(r).ok_or_else(overflow),
                }
            }
        }
    }
}

/// Recursive descent: `expr := term (('+'|'-') term)*`, `term := unary (('*'|'/') unary)*`
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> std::result::Result<Expr, String> {
        if self.tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let expr = self.parse_additive()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected token {:?}", token)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn parse_additive(&mut self) -> std::result::Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> std::result::Result<Expr, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> std::result::Result<Expr, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> std::result::Result<Expr, String> {
        match self.advance().cloned() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                let inner = self.parse_additive()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected `)`".to_string()),
                }
            }
            Some(token) => Err(format!("unexpected token {:?}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
