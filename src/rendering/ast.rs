//! Template syntax tree.

use thiserror::Error as ThisError;

/// A node of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// `{{path}}` substitution.
    Var {
        /// Dotted variable path.
        path: String,
    },
    /// `{{name(args)}}` function call; arguments are kept as source text.
    Call {
        /// Function name.
        name: String,
        /// Raw argument list.
        args: String,
        /// 1-based source line.
        line: usize,
    },
    /// `{{#if}}` group with optional `{{#elif}}` branches and `{{#else}}`.
    If {
        /// Condition branches in source order.
        branches: Vec<Branch>,
        /// Body rendered when no branch matches.
        otherwise: Option<Vec<Self>>,
    },
    /// `{{#each path}}` iteration.
    Each {
        /// Dotted path of the collection.
        path: String,
        /// Body rendered once per element.
        body: Vec<Self>,
    },
    /// `{{block "name"}}` region; renders its body.
    Block {
        /// Block name.
        name: String,
        /// Block content.
        body: Vec<Self>,
    },
    /// `{{include "name"}}` of another template.
    Include {
        /// Included template name.
        name: String,
        /// 1-based source line.
        line: usize,
    },
    /// `{{extends "name"}}` left in the text; renders nothing.
    Extends {
        /// Parent template name.
        parent: String,
    },
    /// Unrecognised tag; stripped from the output.
    Unknown {
        /// Tag content between the braces.
        tag: String,
        /// 1-based source line.
        line: usize,
    },
}

/// One `{{#if}}`/`{{#elif}}` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Condition source.
    pub condition: String,
    /// Body rendered when the condition holds.
    pub body: Vec<Node>,
}

/// Unbalanced or misplaced control tags.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// 1-based line of the offending tag.
    pub line: usize,
}

/// Visits every node depth-first, parents before children.
pub fn walk<'a>(nodes: &'a [Node], visit: &mut impl FnMut(&'a Node)) {
    for node in nodes {
        visit(node);
        match node {
            Node::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    walk(&branch.body, visit);
                }
                if let Some(body) = otherwise {
                    walk(body, visit);
                }
            },
            Node::Each { body, .. } | Node::Block { body, .. } => walk(body, visit),
            _ => {},
        }
    }
}
