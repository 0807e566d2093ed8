//! Template loading with inheritance resolution.
//!
//! The loader reads templates from a [`TemplateStore`], resolves
//! `{{extends}}` chains into effective text, and compiles the result. Both
//! stages go through the [`TemplateCache`].

use std::sync::Arc;
use std::time::SystemTime;

use tracing::instrument;

use super::cache::{ChainStamp, TemplateCache};
use crate::models::RenderWarning;
use crate::rendering::inheritance::{extract_blocks, merge, parent_of, strip_extends};
use crate::rendering::{CompiledTemplate, IncludeResolver};
use crate::storage::{TemplateStore, validate_template_name};
use crate::{Error, Result};

/// State of one inheritance resolution.
#[derive(Default)]
struct Resolution {
    chain: Vec<String>,
    stamps: Vec<ChainStamp>,
    warnings: Vec<RenderWarning>,
}

/// Loads and compiles templates.
#[derive(Clone)]
pub struct TemplateLoader {
    store: Arc<dyn TemplateStore>,
    cache: Arc<TemplateCache>,
}

impl std::fmt::Debug for TemplateLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateLoader")
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl TemplateLoader {
    /// Creates a loader over a store and a cache.
    #[must_use]
    pub fn new(store: Arc<dyn TemplateStore>, cache: Arc<TemplateCache>) -> Self {
        Self { store, cache }
    }

    /// Returns the template store.
    #[must_use]
    pub fn store(&self) -> &dyn TemplateStore {
        self.store.as_ref()
    }

    /// Returns the cache.
    #[must_use]
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Loads a template and its inheritance chain, compiled.
    ///
    /// Returns `Ok(None)` if the template does not exist. A missing parent
    /// is not an error: the child renders on its own with a
    /// [`RenderWarning::MissingParent`] attached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an invalid name,
    /// [`Error::CircularTemplate`] when the `extends` chain loops, or a
    /// store error.
    #[instrument(skip(self), fields(template = name))]
    pub fn load(&self, name: &str) -> Result<Option<Arc<CompiledTemplate>>> {
        validate_template_name(name)?;

        if let Some(template) = self.cache.compiled(name, |stamps| self.is_current(stamps)) {
            return Ok(Some(template));
        }

        let mut resolution = Resolution::default();
        let Some(text) = self.resolve(name, &mut resolution)? else {
            tracing::debug!(template = name, "Template not found");
            return Ok(None);
        };

        let template = Arc::new(CompiledTemplate::compile(name, text, resolution.warnings));
        self.cache
            .store_compiled(name, resolution.stamps, Arc::clone(&template));
        tracing::debug!(
            template = name,
            parsed = template.nodes().is_ok(),
            "Compiled template"
        );
        Ok(Some(template))
    }

    /// Loads the effective text of a template after inheritance merging.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_text(&self, name: &str) -> Result<Option<String>> {
        Ok(self.load(name)?.map(|t| t.text().to_string()))
    }

    /// Reads a raw source, through the source cache.
    fn source(&self, name: &str) -> Result<Option<(Arc<str>, SystemTime)>> {
        let Some(modified) = self.store.modified(name)? else {
            return Ok(None);
        };
        if let Some(text) = self.cache.source(name, modified) {
            return Ok(Some((text, modified)));
        }

        let Some(source) = self.store.read(name)? else {
            return Ok(None);
        };
        let text: Arc<str> = Arc::from(source.text);
        self.cache
            .store_source(name, source.modified, Arc::clone(&text));
        Ok(Some((text, source.modified)))
    }

    /// Resolves `name` to effective text, walking up its parents.
    fn resolve(&self, name: &str, state: &mut Resolution) -> Result<Option<String>> {
        let Some((text, modified)) = self.source(name)? else {
            state.stamps.push((name.to_string(), None));
            return Ok(None);
        };
        state.stamps.push((name.to_string(), Some(modified)));

        let Some(parent) = parent_of(&text) else {
            return Ok(Some(text.to_string()));
        };

        state.chain.push(name.to_string());
        if state.chain.contains(&parent) {
            let mut chain = std::mem::take(&mut state.chain);
            chain.push(parent);
            return Err(Error::CircularTemplate { chain });
        }

        let parent_text = if validate_template_name(&parent).is_ok() {
            self.resolve(&parent, state)?
        } else {
            None
        };
        let child = strip_extends(&text);
        let effective = match (extract_blocks(&child), parent_text) {
            // unbalanced child blocks; the parser reports them
            (None, _) => child,
            (Some(overrides), Some(parent_text)) => merge(&parent_text, &overrides),
            (Some(_), None) => {
                tracing::debug!(template = name, parent = %parent, "Parent template not found");
                state.warnings.push(RenderWarning::MissingParent {
                    template: name.to_string(),
                    parent,
                });
                child
            },
        };
        state.chain.pop();
        Ok(Some(effective))
    }

    /// Checks every stamp of a chain against the store.
    fn is_current(&self, stamps: &[ChainStamp]) -> bool {
        stamps
            .iter()
            .all(|(name, stamp)| matches!(self.store.modified(name), Ok(current) if current == *stamp))
    }
}

impl IncludeResolver for TemplateLoader {
    fn resolve_include(&self, name: &str) -> Result<Option<Arc<CompiledTemplate>>> {
        if validate_template_name(name).is_err() {
            return Ok(None);
        }
        self.load(name)
    }
}
