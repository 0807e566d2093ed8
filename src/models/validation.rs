//! Template validation results.

use serde::Serialize;
use std::fmt;

/// Validation result for a template.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Whether the template has no error-level issues.
    pub is_valid: bool,
    /// List of issues found.
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationResult {
    /// Creates a valid result with no issues.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
        }
    }

    /// Adds an issue; error-level issues mark the result invalid.
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        if issue.severity == IssueSeverity::Error {
            self.is_valid = false;
        }
        self.issues.push(issue);
    }

    /// Returns the error-level issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
    }

    /// Returns the warning-level issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
    }
}

/// A validation issue found in template content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: IssueSeverity,
    /// Description of the issue.
    pub message: String,
    /// 1-based line where the issue was found.
    pub line: Option<usize>,
}

impl ValidationIssue {
    /// Creates a new error-level issue.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            message: message.into(),
            line: None,
        }
    }

    /// Creates a new warning-level issue.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
            line: None,
        }
    }

    /// Sets the line of the issue.
    #[must_use]
    pub const fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line}): {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// The template will fall back or fail to load.
    Error,
    /// The template renders but something is likely wrong.
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_keep_result_valid() {
        let mut result = ValidationResult::valid();
        result.add_issue(ValidationIssue::warning("unknown function 'shout'"));
        assert!(result.is_valid);
        assert_eq!(result.warnings().count(), 1);

        result.add_issue(ValidationIssue::error("unbalanced {{#if}}").at_line(4));
        assert!(!result.is_valid);
        assert_eq!(result.errors().count(), 1);
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::error("unclosed block").at_line(7);
        assert_eq!(issue.to_string(), "error (line 7): unclosed block");
        assert_eq!(
            ValidationIssue::warning("odd").to_string(),
            "warning: odd"
        );
    }
}
