//! Template renderer implementation.
//!
//! Turns a [`CompiledTemplate`] and a [`RenderContext`] into a
//! [`RenderedDocument`]:
//! - Conditionals, iteration, function calls and variables are interpreted
//!   from the syntax tree in a single pass
//! - Blank-line runs are collapsed and leading blank lines trimmed
//! - The leading `---` YAML header is split from the body
//!
//! Faults never abort a render. A template that does not parse renders as
//! its own text with `fallback` set, and every recovered fault is returned
//! as a [`RenderWarning`].

use tracing::instrument;

use super::cleanup::tidy;
use super::compiled::CompiledTemplate;
use super::interpreter::{IncludeResolver, Interpreter, NoIncludes};
use super::scope::Scope;
use crate::models::{RenderContext, RenderWarning, RenderedDocument};
use crate::Result;

/// Default limit on nested `{{include}}` depth.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;

/// The header block delimiter line.
const HEADER_DELIMITER: &str = "---";

/// Template rendering engine.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    max_include_depth: usize,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a renderer with the default include depth limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Sets the include depth limit.
    #[must_use]
    pub const fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Returns the include depth limit.
    #[must_use]
    pub const fn max_include_depth(&self) -> usize {
        self.max_include_depth
    }

    /// Renders a compiled template.
    ///
    /// # Errors
    ///
    /// Returns an error only for include cycles, include depth overflow, or
    /// a failure to load an included template. All other faults are
    /// reported as warnings on the document.
    #[instrument(skip(self, template, ctx, includes), fields(template = %template.name()))]
    pub fn render(
        &self,
        template: &CompiledTemplate,
        ctx: &RenderContext,
        includes: &dyn IncludeResolver,
    ) -> Result<RenderedDocument> {
        let mut warnings = template.warnings().to_vec();

        let (text, fallback) = match template.nodes() {
            Ok(nodes) => {
                let mut interpreter =
                    Interpreter::new(includes, template.name(), self.max_include_depth);
                let mut scope = Scope::new(ctx);
                let mut out = String::with_capacity(template.text().len());
                interpreter.render(nodes, &mut scope, &mut out)?;
                warnings.extend(interpreter.into_warnings());
                (tidy(&out), false)
            },
            Err(e) => {
                warnings.push(RenderWarning::Syntax {
                    message: e.message.clone(),
                    line: e.line,
                });
                (template.text().to_string(), true)
            },
        };

        let (header, body, header_warning) = split_header(&text);
        warnings.extend(header_warning);

        for warning in &warnings {
            tracing::warn!(template = %template.name(), %warning, "Recovered template fault");
        }

        Ok(RenderedDocument {
            template: template.name().to_string(),
            body: body.to_string(),
            text,
            header,
            warnings,
            fallback,
        })
    }

    /// Renders ad-hoc template text without a template store.
    ///
    /// Includes render as missing. Never fails: an unexpected error returns
    /// the original text as a fallback document.
    #[must_use]
    pub fn render_text(&self, text: &str, ctx: &RenderContext) -> RenderedDocument {
        let template = CompiledTemplate::compile("", text, Vec::new());
        self.render(&template, ctx, &NoIncludes)
            .unwrap_or_else(|e| fallback_document(&template, &e.to_string()))
    }
}

/// A document holding the unrendered template text.
pub(crate) fn fallback_document(template: &CompiledTemplate, reason: &str) -> RenderedDocument {
    tracing::warn!(template = %template.name(), reason, "Returning unrendered template text");
    let (header, body, _) = split_header(template.text());
    RenderedDocument {
        template: template.name().to_string(),
        text: template.text().to_string(),
        body: body.to_string(),
        header,
        warnings: vec![RenderWarning::Syntax {
            message: reason.to_string(),
            line: 0,
        }],
        fallback: true,
    }
}

/// Splits a leading `---` delimited YAML header from the body.
///
/// Text without a complete header block has an empty header and is all
/// body. A header that is not a YAML mapping yields an empty header and a
/// warning.
pub(crate) fn split_header(
    text: &str,
) -> (
    serde_json::Map<String, serde_json::Value>,
    &str,
    Option<RenderWarning>,
) {
    let empty = serde_json::Map::new();
    let Some((yaml, body)) = header_block(text) else {
        return (empty, text, None);
    };

    match serde_yaml_ng::from_str::<serde_json::Value>(yaml) {
        Ok(serde_json::Value::Object(map)) => (map, body, None),
        Ok(serde_json::Value::Null) => (empty, body, None),
        Ok(_) => (
            empty,
            body,
            Some(RenderWarning::Header {
                reason: "header is not a key/value mapping".to_string(),
            }),
        ),
        Err(e) => (
            empty,
            body,
            Some(RenderWarning::Header {
                reason: e.to_string(),
            }),
        ),
    }
}

/// Finds the header block: the YAML between the opening and closing
/// delimiter lines, and the text after the closing line.
fn header_block(text: &str) -> Option<(&str, &str)> {
    let (first, rest) = text.split_once('\n')?;
    if first.trim_end() != HEADER_DELIMITER {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == HEADER_DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}
