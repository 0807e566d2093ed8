//! Boolean condition evaluator for `{{#if}}` and `{{#elif}}`.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! top        := 'not' top | and_list
//! and_list   := and_seg ('and' and_seg)*
//! and_seg    := 'not' and_seg | or_list
//! or_list    := or_seg ('or' or_seg)*
//! or_seg     := 'not' or_seg | comparison
//! comparison := operand (op operand)?
//! op         := '==' | '!=' | '>=' | '<=' | '>' | '<'
//! ```
//!
//! So `not a and b` reads as `not (a and b)` and `a and b or c` as
//! `a and (b or c)`. There is no grouping syntax.

use thiserror::Error as ThisError;

use super::scope::Lookup;
use crate::models::{RenderContext, Value};

/// A condition that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{0}")]
pub struct ExpressionError(String);

impl ExpressionError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Evaluates a condition against a context.
///
/// Faults evaluate to `false` and are logged.
#[must_use]
pub fn evaluate(expression: &str, context: &RenderContext) -> bool {
    try_evaluate(expression, context).unwrap_or_else(|e| {
        tracing::warn!(expression, error = %e, "Condition evaluated as false");
        false
    })
}

/// Evaluates a condition, reporting faults to the caller.
///
/// # Errors
///
/// Returns an [`ExpressionError`] for an empty expression, an unterminated
/// quote, a dangling operator or keyword, or a malformed comparison.
pub fn try_evaluate(expression: &str, lookup: &dyn Lookup) -> Result<bool, ExpressionError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExpressionError::new("empty condition"));
    }
    Evaluator { lookup }.top(&tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Quoted(String),
    Op(CmpOp),
    And,
    Or,
    Not,
}

fn tokenize(expression: &str) -> Result<Vec<Tok>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut literal = String::new();
            loop {
                match chars.next() {
                    Some(ch) if ch == c => break,
                    Some(ch) => literal.push(ch),
                    None => return Err(ExpressionError::new("unterminated quote")),
                }
            }
            tokens.push(Tok::Quoted(literal));
        } else if matches!(c, '=' | '!' | '<' | '>') {
            chars.next();
            let followed_by_eq = chars.peek() == Some(&'=');
            if followed_by_eq {
                chars.next();
            }
            let op = match (c, followed_by_eq) {
                ('=', true) => CmpOp::Eq,
                ('!', true) => CmpOp::Ne,
                ('>', true) => CmpOp::Ge,
                ('<', true) => CmpOp::Le,
                ('>', false) => CmpOp::Gt,
                ('<', false) => CmpOp::Lt,
                _ => return Err(ExpressionError::new(format!("unexpected '{c}'"))),
            };
            tokens.push(Tok::Op(op));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || matches!(ch, '"' | '\'' | '=' | '!' | '<' | '>') {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(match word.as_str() {
                "and" => Tok::And,
                "or" => Tok::Or,
                "not" => Tok::Not,
                _ => Tok::Word(word),
            });
        }
    }

    Ok(tokens)
}

struct Evaluator<'l> {
    lookup: &'l dyn Lookup,
}

impl Evaluator<'_> {
    fn top(&self, tokens: &[Tok]) -> Result<bool, ExpressionError> {
        let (negate, rest) = strip_nots(tokens);
        Ok(self.and_list(rest)? != negate)
    }

    fn and_list(&self, tokens: &[Tok]) -> Result<bool, ExpressionError> {
        for segment in split_on(tokens, &Tok::And, "and")? {
            if !self.and_seg(segment)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn and_seg(&self, tokens: &[Tok]) -> Result<bool, ExpressionError> {
        let (negate, rest) = strip_nots(tokens);
        Ok(self.or_list(rest)? != negate)
    }

    fn or_list(&self, tokens: &[Tok]) -> Result<bool, ExpressionError> {
        for segment in split_on(tokens, &Tok::Or, "or")? {
            if self.or_seg(segment)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn or_seg(&self, tokens: &[Tok]) -> Result<bool, ExpressionError> {
        let (negate, rest) = strip_nots(tokens);
        Ok(self.comparison(rest)? != negate)
    }

    fn comparison(&self, tokens: &[Tok]) -> Result<bool, ExpressionError> {
        match tokens {
            [] => Err(ExpressionError::new("missing operand")),
            [operand] => Ok(self.operand(operand)?.is_truthy()),
            [left, Tok::Op(op), right] => {
                let left = self.operand(left)?;
                let right = self.operand(right)?;
                Ok(compare(*op, &left, &right))
            },
            _ => Err(ExpressionError::new("malformed comparison")),
        }
    }

    fn operand(&self, token: &Tok) -> Result<Value, ExpressionError> {
        match token {
            Tok::Quoted(text) => Ok(Value::String(text.clone())),
            Tok::Word(word) => Ok(literal(word).unwrap_or_else(|| {
                self.lookup
                    .lookup_value(word)
                    .unwrap_or_else(|| Value::String(String::new()))
            })),
            Tok::Op(_) => Err(ExpressionError::new("operator without left operand")),
            Tok::And | Tok::Or | Tok::Not => Err(ExpressionError::new("misplaced keyword")),
        }
    }
}

/// Removes a run of leading `not`s; returns whether their count is odd.
fn strip_nots(tokens: &[Tok]) -> (bool, &[Tok]) {
    let count = tokens.iter().take_while(|tok| matches!(tok, Tok::Not)).count();
    (count % 2 == 1, &tokens[count..])
}

/// Splits on a keyword; an empty side is an error.
fn split_on<'t>(
    tokens: &'t [Tok],
    separator: &Tok,
    keyword: &str,
) -> Result<Vec<&'t [Tok]>, ExpressionError> {
    let segments: Vec<&[Tok]> = tokens.split(|t| t == separator).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ExpressionError::new(format!("dangling '{keyword}'")));
    }
    Ok(segments)
}

/// Recognises `true`/`false`/`null`/`none` and numbers.
pub(crate) fn literal(word: &str) -> Option<Value> {
    match word.to_ascii_lowercase().as_str() {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" | "none" => return Some(Value::Null),
        _ => {},
    }
    number_literal(word)
}

/// Parses a numeric token. Words like `inf` or `nan` are not numbers.
pub(crate) fn number_literal(word: &str) -> Option<Value> {
    let first = word.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '-' | '+' | '.')) {
        return None;
    }
    if let Ok(i) = word.parse::<i64>() {
        return Some(Value::Int(i));
    }
    word.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> bool {
    match op {
        CmpOp::Eq => values_equal(left, right),
        CmpOp::Ne => !values_equal(left, right),
        CmpOp::Ge | CmpOp::Le | CmpOp::Gt | CmpOp::Lt => {
            let ordering = match (left, right) {
                (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
                _ => match (left.to_number(), right.to_number()) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
            };
            ordering.is_some_and(|o| match op {
                CmpOp::Ge => o.is_ge(),
                CmpOp::Le => o.is_le(),
                CmpOp::Gt => o.is_gt(),
                _ => o.is_lt(),
            })
        },
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    let blank = |v: &Value| v.is_null() || v.as_str() == Some("");
    match (left, right) {
        (Value::Null, other) | (other, Value::Null) => blank(other),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.to_number() == right.to_number()
        },
        _ => left == right || left.to_display_string() == right.to_display_string(),
    }
}
