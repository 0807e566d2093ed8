//! Template engine facade.
//!
//! Ties a [`TemplateStore`] to the loader, cache and renderer, and exposes
//! the operations callers use: render by name, render ad-hoc text,
//! validate, list and install the built-in templates.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::instrument;

use super::cache::TemplateCache;
use super::defaults::DEFAULT_TEMPLATES;
use super::template_loader::TemplateLoader;
use crate::config::VaultscribeConfig;
use crate::models::{RenderContext, RenderedDocument, ValidationIssue, ValidationResult};
use crate::rendering::inheritance::{block_names, parent_of, strip_extends};
use crate::rendering::{
    CompiledTemplate, KNOWN_FUNCTIONS, NoIncludes, Node, TemplateRenderer, count_tags, parse,
    walk,
};
use crate::storage::{FilesystemTemplateStore, TemplateStore, validate_template_name};
use crate::{Error, Result};

/// Renders, validates and manages note templates.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use vaultscribe::{MemoryTemplateStore, RenderContext, TemplateEngine};
///
/// let store = MemoryTemplateStore::with_templates([("hello", "Hi {{name}}")])?;
/// let engine = TemplateEngine::new(Arc::new(store));
///
/// let ctx = RenderContext::new().with("name", "Ada");
/// let doc = engine.render("hello", &ctx)?.expect("template exists");
/// assert_eq!(doc.body, "Hi Ada");
/// ```
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    loader: TemplateLoader,
    renderer: TemplateRenderer,
}

impl TemplateEngine {
    /// Creates an engine over a store with a default-sized cache.
    #[must_use]
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self::with_cache(store, Arc::new(TemplateCache::default()))
    }

    /// Creates an engine sharing an existing cache.
    #[must_use]
    pub fn with_cache(store: Arc<dyn TemplateStore>, cache: Arc<TemplateCache>) -> Self {
        Self {
            loader: TemplateLoader::new(store, cache),
            renderer: TemplateRenderer::new(),
        }
    }

    /// Creates an engine over the configured template directory.
    #[must_use]
    pub fn from_config(config: &VaultscribeConfig) -> Self {
        let store = FilesystemTemplateStore::new(config.templates_dir());
        Self::with_cache(
            Arc::new(store),
            Arc::new(TemplateCache::new(config.cache_capacity)),
        )
        .with_max_include_depth(config.max_include_depth)
    }

    /// Sets the include depth limit.
    #[must_use]
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.renderer = self.renderer.with_max_include_depth(depth);
        self
    }

    /// Returns the loader.
    #[must_use]
    pub const fn loader(&self) -> &TemplateLoader {
        &self.loader
    }

    /// Renders a stored template.
    ///
    /// Returns `Ok(None)` if the template does not exist. Faults inside the
    /// template are reported as warnings on the document.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name, an inheritance or include
    /// cycle, include depth overflow, or a store failure.
    #[instrument(skip(self, ctx), fields(template = name))]
    pub fn render(&self, name: &str, ctx: &RenderContext) -> Result<Option<RenderedDocument>> {
        let Some(template) = self.loader.load(name)? else {
            return Ok(None);
        };
        let document = self.renderer.render(&template, ctx, &self.loader)?;
        tracing::debug!(
            template = name,
            warnings = document.warnings.len(),
            fallback = document.fallback,
            "Rendered template"
        );
        Ok(Some(document))
    }

    /// Renders ad-hoc template text.
    ///
    /// Includes are resolved against the store; `extends` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for an include cycle, include depth overflow, or a
    /// store failure.
    pub fn render_text(&self, text: &str, ctx: &RenderContext) -> Result<RenderedDocument> {
        let template = CompiledTemplate::compile("", text, Vec::new());
        self.renderer.render(&template, ctx, &self.loader)
    }

    /// Renders ad-hoc text without touching the store.
    #[must_use]
    pub fn render_standalone(&self, text: &str, ctx: &RenderContext) -> RenderedDocument {
        let template = CompiledTemplate::compile("", text, Vec::new());
        self.renderer
            .render(&template, ctx, &NoIncludes)
            .unwrap_or_else(|e| crate::rendering::fallback_document(&template, &e.to_string()))
    }

    /// Checks a stored template for problems without rendering it.
    ///
    /// Errors mean the template would fall back or fail to load:
    /// unbalanced or misplaced tags and cycles. Warnings cover unknown
    /// functions and tags, missing parents and includes, and blocks the
    /// parent does not define.
    ///
    /// Returns `Ok(None)` if the template does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a store failure.
    #[instrument(skip(self), fields(template = name))]
    pub fn validate(&self, name: &str) -> Result<Option<ValidationResult>> {
        validate_template_name(name)?;
        let Some(source) = self.loader.store().read(name)? else {
            return Ok(None);
        };

        let mut result = ValidationResult::valid();
        let source_parses = check_source(&source.text, &mut result);

        match self.loader.load(name) {
            Ok(Some(template)) => {
                for warning in template.warnings() {
                    result.add_issue(ValidationIssue::warning(warning.to_string()));
                }
                match template.nodes() {
                    Ok(nodes) => {
                        let mut chain = vec![name.to_string()];
                        self.check_nodes(nodes, &mut chain, &mut result)?;
                    },
                    Err(e) if source_parses => {
                        result.add_issue(
                            ValidationIssue::error(format!("after inheritance: {}", e.message))
                                .at_line(e.line),
                        );
                    },
                    Err(_) => {},
                }
                self.check_overrides(name, &source.text, &mut result)?;
            },
            Ok(None) => {},
            Err(e) if e.is_cycle() => result.add_issue(ValidationIssue::error(e.to_string())),
            Err(e) => return Err(e),
        }

        tracing::debug!(
            template = name,
            valid = result.is_valid,
            issues = result.issues.len(),
            "Validated template"
        );
        Ok(Some(result))
    }

    /// Lists template names, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    pub fn list(&self) -> Result<Vec<String>> {
        self.loader.store().list()
    }

    /// Writes the built-in templates that are not already present.
    ///
    /// Existing templates are never overwritten. Returns the names written.
    ///
    /// # Errors
    ///
    /// Returns an error if a template cannot be written.
    #[instrument(skip(self))]
    pub fn install_defaults(&self) -> Result<Vec<String>> {
        let store = self.loader.store();
        let mut installed = Vec::new();
        for (name, text) in DEFAULT_TEMPLATES {
            if store.exists(name)? {
                tracing::debug!(template = name, "Keeping existing template");
                continue;
            }
            store.write(name, text)?;
            tracing::info!(template = name, "Installed default template");
            installed.push((*name).to_string());
        }
        Ok(installed)
    }

    /// Reports unknown functions and tags, and checks includes recursively.
    fn check_nodes(
        &self,
        nodes: &[Node],
        chain: &mut Vec<String>,
        result: &mut ValidationResult,
    ) -> Result<()> {
        let mut includes = Vec::new();
        walk(nodes, &mut |node| match node {
            Node::Call { name, line, .. } if !KNOWN_FUNCTIONS.contains(&name.as_str()) => {
                result.add_issue(
                    ValidationIssue::warning(format!("unknown function '{name}'")).at_line(*line),
                );
            },
            Node::Unknown { tag, line } => {
                result.add_issue(
                    ValidationIssue::warning(format!("unrecognised tag '{tag}' will be removed"))
                        .at_line(*line),
                );
            },
            Node::Include { name, line } => includes.push((name.clone(), *line)),
            _ => {},
        });

        let mut seen = BTreeSet::new();
        for (name, line) in includes {
            if !seen.insert(name.clone()) {
                continue;
            }
            self.check_include(&name, line, chain, result)?;
        }
        Ok(())
    }

    fn check_include(
        &self,
        name: &str,
        line: usize,
        chain: &mut Vec<String>,
        result: &mut ValidationResult,
    ) -> Result<()> {
        if chain.iter().any(|n| n == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            let err = Error::CircularTemplate { chain: cycle };
            result.add_issue(ValidationIssue::error(err.to_string()).at_line(line));
            return Ok(());
        }
        if chain.len() > self.renderer.max_include_depth() {
            result.add_issue(
                ValidationIssue::error(format!(
                    "include depth {} exceeded while including '{name}'",
                    self.renderer.max_include_depth()
                ))
                .at_line(line),
            );
            return Ok(());
        }

        let included = if validate_template_name(name).is_ok() {
            self.loader.load(name)
        } else {
            Ok(None)
        };
        match included {
            Ok(Some(template)) => {
                if let Ok(nodes) = template.nodes() {
                    chain.push(name.to_string());
                    let checked = self.check_nodes(nodes, chain, result);
                    chain.pop();
                    checked?;
                }
            },
            Ok(None) => result.add_issue(
                ValidationIssue::warning(format!("included template '{name}' not found"))
                    .at_line(line),
            ),
            Err(e) if e.is_cycle() => {
                result.add_issue(ValidationIssue::error(e.to_string()).at_line(line));
            },
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Warns about child blocks the parent does not define.
    fn check_overrides(&self, name: &str, text: &str, result: &mut ValidationResult) -> Result<()> {
        let Some(parent) = parent_of(text) else {
            return Ok(());
        };
        if validate_template_name(&parent).is_err() {
            return Ok(());
        }
        let Some(parent_text) = self.loader.load_text(&parent)? else {
            return Ok(());
        };

        let defined: BTreeSet<String> = block_names(&parent_text).into_iter().collect();
        for block in block_names(&strip_extends(text)) {
            if !defined.contains(&block) {
                result.add_issue(ValidationIssue::warning(format!(
                    "block '{block}' in '{name}' is not defined by parent '{parent}'"
                )));
            }
        }
        Ok(())
    }
}

/// Checks tag balance and parseability; returns whether the text parses.
fn check_source(text: &str, result: &mut ValidationResult) -> bool {
    for (group, opened, closed) in count_tags(text).unbalanced() {
        result.add_issue(ValidationIssue::error(format!(
            "unbalanced {group}: {opened} opened, {closed} closed"
        )));
    }
    match parse(text) {
        Ok(_) => true,
        Err(e) => {
            result.add_issue(ValidationIssue::error(e.message).at_line(e.line));
            false
        },
    }
}
