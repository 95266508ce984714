//! Arithmetic expressions over numeric columns, used to derive computed
//! columns.
//!
//! Grammar: numbers, numeric column names, `+ - * /`, unary minus and
//! parentheses. A missing operand value propagates as NaN.

use crate::error::{MiningError, Result};
use crate::record::{Record, RecordScheme};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Column(usize),
    Negate(Box<Node>),
    Binary(Box<Node>, Operator, Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A parsed expression bound to the numeric columns of a scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    pub fn parse(scheme: &RecordScheme, text: &str) -> Result<Self> {
        let mut parser = Parser {
            scheme,
            input: text,
            pos: 0,
        };
        let root = parser.expression()?;
        parser.skip_whitespace();
        if parser.pos < text.len() {
            return Err(MiningError::syntax(text, format!("unexpected input at offset {}", parser.pos)));
        }
        Ok(Self {
            source: text.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, record: &Record) -> f64 {
        eval(&self.root, record)
    }
}

fn eval(node: &Node, record: &Record) -> f64 {
    match node {
        Node::Number(v) => *v,
        Node::Column(index) => record.numeric_value(*index),
        Node::Negate(inner) => -eval(inner, record),
        Node::Binary(left, op, right) => {
            let (l, r) = (eval(left, record), eval(right, record));
            match op {
                Operator::Add => l + r,
                Operator::Subtract => l - r,
                Operator::Multiply => l * r,
                Operator::Divide => l / r,
            }
        }
    }
}

struct Parser<'a> {
    scheme: &'a RecordScheme,
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.input[self.pos..].chars().next()
    }

    fn expression(&mut self) -> Result<Node> {
        let mut left = self.term()?;
        while let Some(op) = self.peek().and_then(|c| match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            _ => None,
        }) {
            self.pos += 1;
            let right = self.term()?;
            left = Node::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Node> {
        let mut left = self.factor()?;
        while let Some(op) = self.peek().and_then(|c| match c {
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }) {
            self.pos += 1;
            let right = self.factor()?;
            left = Node::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Node> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(Node::Negate(Box::new(self.factor()?)))
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.expression()?;
                if self.peek() != Some(')') {
                    return Err(MiningError::syntax(self.input, "missing ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let literal = self.take_while(|c| c.is_ascii_digit() || c == '.');
                literal
                    .parse::<f64>()
                    .map(Node::Number)
                    .map_err(|_| MiningError::InvalidNumber(literal.to_string()))
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
                let abs = self.scheme.abs_index(name)?;
                if !self.scheme.is_numeric(abs) {
                    return Err(MiningError::ColumnKind {
                        name: name.to_string(),
                        expected: "numeric",
                    });
                }
                Ok(Node::Column(self.scheme.to_numeric_index(abs)))
            }
            _ => Err(MiningError::syntax(self.input, format!("expected a value at offset {}", self.pos))),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let input = self.input;
        let start = self.pos;
        let rest = &input[start..];
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &input[start..start + len]
    }
}
