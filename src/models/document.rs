//! Rendered documents and the warnings collected while producing them.

use serde::Serialize;
use thiserror::Error as ThisError;

/// A recovered fault observed while loading or rendering a template.
///
/// Warnings never abort a render. They are returned alongside the output so
/// callers can alert on broken templates instead of the faults disappearing.
#[derive(Debug, Clone, PartialEq, Eq, ThisError, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderWarning {
    /// The template could not be parsed; the original text was returned.
    #[error("template syntax error at line {line}: {message}")]
    Syntax {
        /// Parser message.
        message: String,
        /// 1-based line of the offending tag.
        line: usize,
    },

    /// A condition could not be evaluated and was treated as false.
    #[error("could not evaluate condition '{expression}': {reason}")]
    Evaluation {
        /// The condition source.
        expression: String,
        /// Why evaluation failed.
        reason: String,
    },

    /// A function call produced no output because of its arguments.
    #[error("function '{name}' failed: {reason}")]
    Function {
        /// Function name.
        name: String,
        /// Why the call degraded.
        reason: String,
    },

    /// A call names a function outside the built-in library.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name.
        name: String,
    },

    /// A tag that is neither a variable nor a known control tag was removed.
    #[error("removed unrecognised tag '{{{{{tag}}}}}'")]
    UnknownTag {
        /// Tag content between the braces.
        tag: String,
    },

    /// An `include` named a template that does not exist.
    #[error("included template '{name}' not found")]
    MissingInclude {
        /// The missing template.
        name: String,
    },

    /// An `extends` named a parent that does not exist.
    #[error("template '{template}' extends missing parent '{parent}'")]
    MissingParent {
        /// The child template.
        template: String,
        /// The missing parent.
        parent: String,
    },

    /// The rendered header block was not valid YAML.
    #[error("header block could not be parsed: {reason}")]
    Header {
        /// Parser message.
        reason: String,
    },
}

/// The result of rendering a template.
///
/// Produced fresh on every call and never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedDocument {
    /// Name of the rendered template, empty for ad-hoc text.
    pub template: String,
    /// Full rendered text including the header block.
    pub text: String,
    /// Parsed `key: value` pairs of the leading `---` header block.
    pub header: serde_json::Map<String, serde_json::Value>,
    /// Text after the header block.
    pub body: String,
    /// Faults recovered while rendering.
    pub warnings: Vec<RenderWarning>,
    /// True when the template could not be rendered and `text` holds the
    /// original template text instead.
    pub fallback: bool,
}

impl RenderedDocument {
    /// Returns true when rendering produced no warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && !self.fallback
    }

    /// Looks up a header field as a string.
    #[must_use]
    pub fn header_str(&self, key: &str) -> Option<&str> {
        self.header.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let warning = RenderWarning::UnknownTag {
            tag: "#unless x".to_string(),
        };
        assert_eq!(warning.to_string(), "removed unrecognised tag '{{#unless x}}'");

        let warning = RenderWarning::Syntax {
            message: "unclosed {{#if}}".to_string(),
            line: 3,
        };
        assert_eq!(
            warning.to_string(),
            "template syntax error at line 3: unclosed {{#if}}"
        );
    }

    #[test]
    fn test_warning_serializes_with_kind() {
        let warning = RenderWarning::MissingInclude {
            name: "footer".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "missing_include");
        assert_eq!(json["name"], "footer");
    }

    #[test]
    fn test_is_clean() {
        let mut doc = RenderedDocument::default();
        assert!(doc.is_clean());

        doc.warnings.push(RenderWarning::UnknownFunction {
            name: "shout".to_string(),
        });
        assert!(!doc.is_clean());
    }

    #[test]
    fn test_header_str() {
        let mut doc = RenderedDocument::default();
        doc.header
            .insert("type".to_string(), serde_json::Value::from("idea"));
        assert_eq!(doc.header_str("type"), Some("idea"));
        assert_eq!(doc.header_str("missing"), None);
    }
}
