// Copyright 2026 MapSQL Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sandboxed condition/substitution expressions
//!
//! A deliberately small, method-free expression language evaluated against
//! the composition binding context: literals, property paths with `.` and
//! `[index]`, comparisons, boolean logic and arithmetic. Expressions are
//! compiled to an AST once, when the owning fragment node is built, and
//! evaluated per composition.
//!
//! Grammar (precedence low to high):
//!
//! ```text
//! expr  := and ( ('||' | 'or')  and )*
//! and   := not ( ('&&' | 'and') not )*
//! not   := ('!' | 'not') not | cmp
//! cmp   := sum ( ('=='|'!='|'<'|'<='|'>'|'>=') sum )?
//! sum   := term ( ('+'|'-') term )*
//! term  := unary ( ('*'|'/'|'%') unary )*
//! unary := '-' unary | primary
//! primary := literal | path | '(' expr ')'
//! path  := ident ( '.' ident | '[' expr ']' )*
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::core::{Error, Result, Value};

/// Resolves the root name of a property path during evaluation
pub trait BindingLookup {
    /// Look up a root binding by name; `None` means unbound (treated as null)
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Compiled expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Property path rooted at a binding name
    Path { root: String, segments: Vec<Segment> },
    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// One step of a property path after the root
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Named field access on a map value
    Field(String),
    /// Computed index access on an array value
    Index(Box<Expr>),
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation
    Not,
    /// Arithmetic negation
    Neg,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Expr {
    /// Compile an expression string to an AST
    pub fn compile(source: &str) -> Result<Expr> {
        let tokens = lex(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::expression_parse(
                source,
                format!("unexpected trailing input at token {}", parser.pos),
            ));
        }
        Ok(expr)
    }

    /// Evaluate against a binding context. Unbound/missing paths evaluate
    /// to null rather than failing: conditions routinely probe for absent
    /// properties.
    pub fn eval(&self, bindings: &dyn BindingLookup) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Path { root, segments } => {
                let mut current = bindings.resolve(root).unwrap_or(Value::Null);
                for segment in segments {
                    current = match segment {
                        Segment::Field(name) => current.get_path(name).unwrap_or(Value::Null),
                        Segment::Index(index) => {
                            let idx = match index.eval(bindings)? {
                                Value::Integer(i) if i >= 0 => i as usize,
                                other => {
                                    return Err(Error::type_conversion(
                                        other.type_spec().to_string(),
                                        "array index",
                                    ))
                                }
                            };
                            match current {
                                Value::Array(items) => {
                                    items.get(idx).cloned().unwrap_or(Value::Null)
                                }
                                _ => Value::Null,
                            }
                        }
                    };
                }
                Ok(current)
            }
            Expr::Unary { op, operand } => {
                let value = operand.eval(bindings)?;
                match op {
                    UnaryOp::Not => Ok(Value::Boolean(!truthy(&value))),
                    UnaryOp::Neg => match value {
                        Value::Integer(i) => Ok(Value::Integer(-i)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(Error::type_conversion(
                            other.type_spec().to_string(),
                            "number",
                        )),
                    },
                }
            }
            Expr::Binary { op, left, right } => match op {
                // Short-circuit logic
                BinaryOp::Or => {
                    let lhs = left.eval(bindings)?;
                    if truthy(&lhs) {
                        return Ok(Value::Boolean(true));
                    }
                    Ok(Value::Boolean(truthy(&right.eval(bindings)?)))
                }
                BinaryOp::And => {
                    let lhs = left.eval(bindings)?;
                    if !truthy(&lhs) {
                        return Ok(Value::Boolean(false));
                    }
                    Ok(Value::Boolean(truthy(&right.eval(bindings)?)))
                }
                BinaryOp::Eq => Ok(Value::Boolean(left.eval(bindings)? == right.eval(bindings)?)),
                BinaryOp::Ne => Ok(Value::Boolean(left.eval(bindings)? != right.eval(bindings)?)),
                BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                    let lhs = left.eval(bindings)?;
                    let rhs = right.eval(bindings)?;
                    let ordering = lhs.partial_cmp_value(&rhs).ok_or_else(|| {
                        Error::IncomparableValues {
                            left: lhs.type_spec().to_string(),
                            right: rhs.type_spec().to_string(),
                        }
                    })?;
                    let result = match op {
                        BinaryOp::Lt => ordering == Ordering::Less,
                        BinaryOp::Le => ordering != Ordering::Greater,
                        BinaryOp::Gt => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    };
                    Ok(Value::Boolean(result))
                }
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                    arithmetic(*op, left.eval(bindings)?, right.eval(bindings)?)
                }
            },
        }
    }

    /// Evaluate as a boolean test: booleans as-is, numbers are true when
    /// non-zero, everything else is true when non-null.
    pub fn eval_bool(&self, bindings: &dyn BindingLookup) -> Result<bool> {
        Ok(truthy(&self.eval(bindings)?))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        _ => true,
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    if op == BinaryOp::Add {
        if let (Value::Text(a), Value::Text(b)) = (&lhs, &rhs) {
            return Ok(Value::text(format!("{a}{b}")));
        }
    }
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Add => Ok(Value::Integer(a.wrapping_add(b))),
                BinaryOp::Sub => Ok(Value::Integer(a.wrapping_sub(b))),
                BinaryOp::Mul => Ok(Value::Integer(a.wrapping_mul(b))),
                BinaryOp::Div if b == 0 => Err(Error::DivisionByZero),
                BinaryOp::Div => Ok(Value::Integer(a / b)),
                BinaryOp::Rem if b == 0 => Err(Error::DivisionByZero),
                _ => Ok(Value::Integer(a % b)),
            }
        }
        _ => {
            let a = as_float(&lhs)?;
            let b = as_float(&rhs)?;
            match op {
                BinaryOp::Add => Ok(Value::Float(a + b)),
                BinaryOp::Sub => Ok(Value::Float(a - b)),
                BinaryOp::Mul => Ok(Value::Float(a * b)),
                BinaryOp::Div if b == 0.0 => Err(Error::DivisionByZero),
                BinaryOp::Div => Ok(Value::Float(a / b)),
                BinaryOp::Rem if b == 0.0 => Err(Error::DivisionByZero),
                _ => Ok(Value::Float(a % b)),
            }
        }
    }
}

fn as_float(value: &Value) -> Result<f64> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(Error::type_conversion(
            other.type_spec().to_string(),
            "number",
        )),
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Sym(Sym),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sym {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{s}"),
            Token::Int(i) => write!(f, "{i}"),
            Token::Float(v) => write!(f, "{v}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Sym(s) => write!(f, "{s:?}"),
        }
    }
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '(' => {
                tokens.push(Token::Sym(Sym::LParen));
                i += 1;
            }
            ')' => {
                tokens.push(Token::Sym(Sym::RParen));
                i += 1;
            }
            '[' => {
                tokens.push(Token::Sym(Sym::LBracket));
                i += 1;
            }
            ']' => {
                tokens.push(Token::Sym(Sym::RBracket));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Sym(Sym::Dot));
                i += 1;
            }
            '+' => {
                tokens.push(Token::Sym(Sym::Plus));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Sym(Sym::Minus));
                i += 1;
            }
            '*' => {
                tokens.push(Token::Sym(Sym::Star));
                i += 1;
            }
            '/' => {
                tokens.push(Token::Sym(Sym::Slash));
                i += 1;
            }
            '%' => {
                tokens.push(Token::Sym(Sym::Percent));
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Sym(Sym::EqEq));
                    i += 2;
                } else {
                    return Err(Error::expression_parse(source, "single '=' (use '==')"));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Sym(Sym::NotEq));
                    i += 2;
                } else {
                    tokens.push(Token::Sym(Sym::Bang));
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Sym(Sym::Le));
                    i += 2;
                } else {
                    tokens.push(Token::Sym(Sym::Lt));
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Sym(Sym::Ge));
                    i += 2;
                } else {
                    tokens.push(Token::Sym(Sym::Gt));
                    i += 1;
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token::Sym(Sym::AndAnd));
                    i += 2;
                } else {
                    return Err(Error::expression_parse(source, "single '&' (use '&&')"));
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token::Sym(Sym::OrOr));
                    i += 2;
                } else {
                    return Err(Error::expression_parse(source, "single '|' (use '||')"));
                }
            }
            '\'' | '"' => {
                let quote = bytes[i];
                let start = i + 1;
                let mut j = start;
                while j < bytes.len() && bytes[j] != quote {
                    j += 1;
                }
                if j == bytes.len() {
                    return Err(Error::expression_parse(source, "unterminated string"));
                }
                tokens.push(Token::Str(source[start..j].to_string()));
                i = j + 1;
            }
            '0'..='9' => {
                let start = i;
                let mut is_float = false;
                while i < bytes.len()
                    && (bytes[i].is_ascii_digit()
                        || (bytes[i] == b'.'
                            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)))
                {
                    if bytes[i] == b'.' {
                        is_float = true;
                    }
                    i += 1;
                }
                let text = &source[start..i];
                if is_float {
                    let v = text
                        .parse::<f64>()
                        .map_err(|e| Error::expression_parse(source, e.to_string()))?;
                    tokens.push(Token::Float(v));
                } else {
                    let v = text
                        .parse::<i64>()
                        .map_err(|e| Error::expression_parse(source, e.to_string()))?;
                    tokens.push(Token::Int(v));
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(source[start..i].to_string()));
            }
            // Identifiers are ASCII; non-ASCII text is only valid inside
            // string literals.
            c if !c.is_ascii() => {
                return Err(Error::expression_parse(
                    source,
                    "non-ASCII character outside a string literal",
                ))
            }
            other => {
                return Err(Error::expression_parse(
                    source,
                    format!("unexpected character '{other}'"),
                ))
            }
        }
    }
    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_sym(&mut self, sym: Sym) -> bool {
        if self.peek() == Some(&Token::Sym(sym)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(s)) if s == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_sym(&mut self, sym: Sym, what: &str) -> Result<()> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(Error::expression_parse(self.source, format!("expected {what}")))
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_sym(Sym::OrOr) || self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat_sym(Sym::AndAnd) || self.eat_keyword("and") {
            let right = self.parse_not()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat_sym(Sym::Bang) || self.eat_keyword("not") {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let left = self.parse_sum()?;
        let op = match self.peek() {
            Some(Token::Sym(Sym::EqEq)) => Some(BinaryOp::Eq),
            Some(Token::Sym(Sym::NotEq)) => Some(BinaryOp::Ne),
            Some(Token::Sym(Sym::Lt)) => Some(BinaryOp::Lt),
            Some(Token::Sym(Sym::Le)) => Some(BinaryOp::Le),
            Some(Token::Sym(Sym::Gt)) => Some(BinaryOp::Gt),
            Some(Token::Sym(Sym::Ge)) => Some(BinaryOp::Ge),
            _ => None,
        };
        let Some(op) = op else { return Ok(left) };
        self.pos += 1;
        let right = self.parse_sum()?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_sum(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = if self.eat_sym(Sym::Plus) {
                BinaryOp::Add
            } else if self.eat_sym(Sym::Minus) {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.eat_sym(Sym::Star) {
                BinaryOp::Mul
            } else if self.eat_sym(Sym::Slash) {
                BinaryOp::Div
            } else if self.eat_sym(Sym::Percent) {
                BinaryOp::Rem
            } else {
                return Ok(left);
            };
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat_sym(Sym::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Integer(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::text(s))),
            Some(Token::Sym(Sym::LParen)) => {
                let inner = self.parse_or()?;
                self.expect_sym(Sym::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Boolean(true))),
                "false" => Ok(Expr::Literal(Value::Boolean(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ => self.parse_path(name),
            },
            Some(other) => Err(Error::expression_parse(
                self.source,
                format!("unexpected token {other}"),
            )),
            None => Err(Error::expression_parse(self.source, "unexpected end of input")),
        }
    }

    fn parse_path(&mut self, root: String) -> Result<Expr> {
        let mut segments = Vec::new();
        loop {
            if self.eat_sym(Sym::Dot) {
                match self.advance() {
                    Some(Token::Ident(name)) => segments.push(Segment::Field(name)),
                    _ => {
                        return Err(Error::expression_parse(
                            self.source,
                            "expected property name after '.'",
                        ))
                    }
                }
            } else if self.eat_sym(Sym::LBracket) {
                let index = self.parse_or()?;
                self.expect_sym(Sym::RBracket, "']'")?;
                segments.push(Segment::Index(Box::new(index)));
            } else {
                return Ok(Expr::Path { root, segments });
            }
        }
    }
}
