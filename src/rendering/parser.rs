//! Recursive-descent parser from tokens to a [`Node`] tree.

use std::iter::Peekable;
use std::vec::IntoIter;

use super::ast::{Branch, Node, ParseError};
use super::lexer::{Token, TokenKind, tokenize};

/// Deepest allowed nesting of `{{#if}}`, `{{#each}}` and `{{block}}` groups.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parses template source into a syntax tree.
///
/// # Errors
///
/// Returns a [`ParseError`] for an unclosed `{{#if}}`, `{{#each}}` or
/// `{{block}}`, and for an `{{#elif}}`, `{{#else}}` or closing tag that
/// does not belong to an open group, and for groups nested deeper than
/// [`MAX_NESTING_DEPTH`].
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(source).into_iter().peekable(),
        depth: 0,
    };
    let (nodes, terminator) = parser.parse_nodes()?;
    match terminator {
        None => Ok(nodes),
        Some(token) => Err(ParseError {
            message: format!("unexpected {}", token.kind.describe()),
            line: token.line,
        }),
    }
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    /// Number of groups currently open.
    depth: usize,
}

impl Parser {
    /// Parses until a group terminator or end of input.
    ///
    /// Returns the nodes and the terminator that stopped the scan, if any.
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Option<Token>), ParseError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            let line = token.line;
            let node = match token.kind {
                TokenKind::Text(text) => Node::Text(text),
                TokenKind::Var(path) => Node::Var { path },
                TokenKind::Call { name, args } => Node::Call { name, args, line },
                TokenKind::Include(name) => Node::Include { name, line },
                TokenKind::Extends(parent) => Node::Extends { parent },
                TokenKind::Unknown(tag) => Node::Unknown { tag, line },
                TokenKind::If(condition) => {
                    self.nested(line, |parser| parser.parse_if(condition, line))?
                },
                TokenKind::Each(path) => {
                    let body = self.nested(line, |parser| {
                        parser.parse_group("{{#each}}", line, |k| {
                            matches!(k, TokenKind::EndEach)
                        })
                    })?;
                    Node::Each { path, body }
                },
                TokenKind::Block(name) => {
                    let body = self.nested(line, |parser| {
                        parser.parse_group("{{block}}", line, |k| {
                            matches!(k, TokenKind::EndBlock)
                        })
                    })?;
                    Node::Block { name, body }
                },
                TokenKind::Elif(_)
                | TokenKind::Else
                | TokenKind::EndIf
                | TokenKind::EndEach
                | TokenKind::EndBlock => return Ok((nodes, Some(token))),
            };
            nodes.push(node);
        }

        Ok((nodes, None))
    }

    /// Runs `parse` one group level deeper.
    fn nested<T>(
        &mut self,
        line: usize,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError {
                message: format!("nesting deeper than {MAX_NESTING_DEPTH}"),
                line,
            });
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    /// Parses a body that must end with the given closing tag.
    fn parse_group(
        &mut self,
        opener: &str,
        line: usize,
        is_close: impl Fn(&TokenKind) -> bool,
    ) -> Result<Vec<Node>, ParseError> {
        let (body, terminator) = self.parse_nodes()?;
        match terminator {
            Some(token) if is_close(&token.kind) => Ok(body),
            Some(token) => Err(ParseError {
                message: format!(
                    "unexpected {} inside {opener} opened at line {line}",
                    token.kind.describe()
                ),
                line: token.line,
            }),
            None => Err(unclosed(opener, line)),
        }
    }

    fn parse_if(&mut self, condition: String, line: usize) -> Result<Node, ParseError> {
        let mut branches = Vec::new();
        let mut condition = condition;

        loop {
            let (body, terminator) = self.parse_nodes()?;
            branches.push(Branch { condition, body });

            let Some(token) = terminator else {
                return Err(unclosed("{{#if}}", line));
            };
            match token.kind {
                TokenKind::EndIf => {
                    return Ok(Node::If {
                        branches,
                        otherwise: None,
                    });
                },
                TokenKind::Elif(next) => condition = next,
                TokenKind::Else => {
                    let otherwise = self.parse_else(line)?;
                    return Ok(Node::If {
                        branches,
                        otherwise: Some(otherwise),
                    });
                },
                other => {
                    return Err(ParseError {
                        message: format!(
                            "unexpected {} inside {{{{#if}}}} opened at line {line}",
                            other.describe()
                        ),
                        line: token.line,
                    });
                },
            }
        }
    }

    fn parse_else(&mut self, line: usize) -> Result<Vec<Node>, ParseError> {
        let (body, terminator) = self.parse_nodes()?;
        match terminator {
            Some(Token {
                kind: TokenKind::EndIf,
                ..
            }) => Ok(body),
            Some(token) => Err(ParseError {
                message: format!(
                    "unexpected {} after {{{{#else}}}} of {{{{#if}}}} opened at line {line}",
                    token.kind.describe()
                ),
                line: token.line,
            }),
            None => Err(unclosed("{{#if}}", line)),
        }
    }
}

fn unclosed(opener: &str, line: usize) -> ParseError {
    ParseError {
        message: format!("unclosed {opener}"),
        line,
    }
}
