//! Renders a syntax tree against a scope.

use std::sync::Arc;

use super::ast::Node;
use super::compiled::CompiledTemplate;
use super::expression::try_evaluate;
use super::functions::{self, FunctionError};
use super::scope::{Lookup, Scope};
use crate::models::{RenderWarning, Value};
use crate::{Error, Result};

/// Supplies templates for `{{include "name"}}`.
pub trait IncludeResolver {
    /// Loads a template by name; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be loaded, for example
    /// because of an inheritance cycle.
    fn resolve_include(&self, name: &str) -> Result<Option<Arc<CompiledTemplate>>>;
}

/// Resolver for renders without a template store; every include is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve_include(&self, _name: &str) -> Result<Option<Arc<CompiledTemplate>>> {
        Ok(None)
    }
}

pub(crate) struct Interpreter<'r> {
    resolver: &'r dyn IncludeResolver,
    include_chain: Vec<String>,
    max_include_depth: usize,
    warnings: Vec<RenderWarning>,
}

impl<'r> Interpreter<'r> {
    pub(crate) fn new(
        resolver: &'r dyn IncludeResolver,
        template: &str,
        max_include_depth: usize,
    ) -> Self {
        let include_chain = if template.is_empty() {
            Vec::new()
        } else {
            vec![template.to_string()]
        };
        Self {
            resolver,
            include_chain,
            max_include_depth,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn into_warnings(self) -> Vec<RenderWarning> {
        self.warnings
    }

    /// Renders nodes into `out`.
    ///
    /// Only include cycles and load failures of included templates are
    /// errors; everything else becomes a warning.
    pub(crate) fn render(
        &mut self,
        nodes: &[Node],
        scope: &mut Scope<'_>,
        out: &mut String,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Var { path } => {
                    if let Some(value) = scope.lookup_value(path) {
                        out.push_str(&value.to_display_string());
                    }
                },
                Node::Call { name, args, .. } => match functions::call(name, args, &*scope) {
                    Ok(text) => out.push_str(&text),
                    Err(FunctionError::Unknown) => {
                        self.warnings
                            .push(RenderWarning::UnknownFunction { name: name.clone() });
                    },
                    Err(FunctionError::Degraded(reason)) => {
                        self.warnings.push(RenderWarning::Function {
                            name: name.clone(),
                            reason,
                        });
                    },
                },
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let chosen = branches
                        .iter()
                        .find(|branch| self.condition(&branch.condition, scope))
                        .map(|branch| branch.body.as_slice())
                        .or(otherwise.as_deref());
                    if let Some(body) = chosen {
                        self.render(body, scope, out)?;
                    }
                },
                Node::Each { path, body } => self.render_each(path, body, scope, out)?,
                Node::Block { body, .. } => self.render(body, scope, out)?,
                Node::Include { name, .. } => self.render_include(name, scope, out)?,
                Node::Extends { .. } => {},
                Node::Unknown { tag, .. } => {
                    self.warnings
                        .push(RenderWarning::UnknownTag { tag: tag.clone() });
                },
            }
        }
        Ok(())
    }

    fn condition(&mut self, expression: &str, scope: &Scope<'_>) -> bool {
        try_evaluate(expression, scope).unwrap_or_else(|e| {
            self.warnings.push(RenderWarning::Evaluation {
                expression: expression.to_string(),
                reason: e.to_string(),
            });
            false
        })
    }

    fn render_each(
        &mut self,
        path: &str,
        body: &[Node],
        scope: &mut Scope<'_>,
        out: &mut String,
    ) -> Result<()> {
        let Some(Value::List(items)) = scope.lookup_value(path) else {
            return Ok(());
        };

        let mut previous: Option<String> = None;
        for (index, item) in items.into_iter().enumerate() {
            let mut chunk = String::new();
            scope.push(item, index);
            let rendered = self.render(body, scope, &mut chunk);
            scope.pop();
            rendered?;

            // multi-line bodies are newline-separated, inline ones concatenated
            if let Some(prev) = &previous
                && chunk.contains('\n')
                && !prev.ends_with('\n')
                && !chunk.starts_with('\n')
            {
                out.push('\n');
            }
            out.push_str(&chunk);
            previous = Some(chunk);
        }
        Ok(())
    }

    fn render_include(&mut self, name: &str, scope: &mut Scope<'_>, out: &mut String) -> Result<()> {
        if self.include_chain.iter().any(|n| n == name) {
            let mut chain = self.include_chain.clone();
            chain.push(name.to_string());
            return Err(Error::CircularTemplate { chain });
        }
        if self.include_chain.len() > self.max_include_depth {
            return Err(Error::IncludeDepthExceeded {
                name: name.to_string(),
                depth: self.max_include_depth,
            });
        }

        let Some(included) = self.resolver.resolve_include(name)? else {
            self.warnings.push(RenderWarning::MissingInclude {
                name: name.to_string(),
            });
            return Ok(());
        };
        self.warnings.extend_from_slice(included.warnings());

        match included.nodes() {
            Ok(nodes) => {
                self.include_chain.push(name.to_string());
                let rendered = self.render(nodes, scope, out);
                self.include_chain.pop();
                rendered
            },
            Err(e) => {
                self.warnings.push(RenderWarning::Syntax {
                    message: format!("in included template '{name}': {}", e.message),
                    line: e.line,
                });
                out.push_str(included.text());
                Ok(())
            },
        }
    }
}
