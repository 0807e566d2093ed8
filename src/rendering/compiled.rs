//! Templates prepared for rendering.

use super::ast::{Node, ParseError};
use super::parser::parse;
use crate::models::RenderWarning;

/// A template after inheritance merging and parsing.
///
/// Compiled templates are independent of any context and are shared through
/// the template cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    name: String,
    text: String,
    parsed: Result<Vec<Node>, ParseError>,
    warnings: Vec<RenderWarning>,
}

impl CompiledTemplate {
    /// Parses effective template text.
    ///
    /// `warnings` are faults found while loading, such as a missing parent;
    /// they are reported with every render of this template.
    #[must_use]
    pub fn compile(
        name: impl Into<String>,
        text: impl Into<String>,
        warnings: Vec<RenderWarning>,
    ) -> Self {
        let text = text.into();
        let parsed = parse(&text);
        Self {
            name: name.into(),
            text,
            parsed,
            warnings,
        }
    }

    /// Template name; empty for ad-hoc text.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective text after inheritance merging.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parsed nodes, or the parse error.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if the effective text did not parse.
    pub fn nodes(&self) -> Result<&[Node], &ParseError> {
        self.parsed.as_deref()
    }

    /// Load-time warnings.
    #[must_use]
    pub fn warnings(&self) -> &[RenderWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_keeps_text_and_parse_result() {
        let ok = CompiledTemplate::compile("t", "Hi {{name}}", Vec::new());
        assert_eq!(ok.name(), "t");
        assert_eq!(ok.text(), "Hi {{name}}");
        assert_eq!(ok.nodes().map(<[Node]>::len), Ok(2));

        let broken = CompiledTemplate::compile("b", "{{#if x}}", Vec::new());
        assert!(broken.nodes().is_err());
    }
}
