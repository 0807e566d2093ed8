//! # Vaultscribe
//!
//! Template-driven note rendering for a personal knowledge vault.
//!
//! Vaultscribe turns a note-worthy event (a chat message plus an optional AI
//! analysis) into a Markdown document with a YAML header block, using a small
//! templating language stored alongside the vault.
//!
//! ## Features
//!
//! - Variable interpolation with typed formatting (`{{author_name}}`)
//! - Conditionals with a boolean expression grammar (`{{#if count > 3}}`)
//! - Iteration over lists (`{{#each ai_tags}}`)
//! - Multi-level inheritance with overridable blocks and includes
//! - A fixed library of total formatting functions (`{{truncate(content, 50)}}`)
//! - Lenient rendering: broken templates degrade to visible output plus
//!   typed warnings instead of failing
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vaultscribe::{FilesystemTemplateStore, RenderContext, TemplateEngine};
//!
//! let store = FilesystemTemplateStore::new("vault/99_Meta/Templates");
//! let engine = TemplateEngine::new(Arc::new(store));
//!
//! let ctx = RenderContext::new().with("author_name", "Ada");
//! if let Some(doc) = engine.render("idea_note", &ctx)? {
//!     println!("{}", doc.body);
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::VaultscribeConfig;
pub use models::{
    AiAnalysis, IssueSeverity, MessageData, RenderContext, RenderWarning, RenderedDocument,
    ValidationIssue, ValidationResult, Value, VaultFolder, VaultNote,
};
pub use rendering::TemplateRenderer;
pub use services::{ContextBuilder, NoteAssembler, TemplateCache, TemplateEngine, TemplateLoader};
pub use storage::{FilesystemTemplateStore, MemoryTemplateStore, TemplateStore};

/// Error type for vaultscribe operations.
///
/// Only structural failures surface as errors. A template that cannot be
/// found is reported as `Ok(None)`, and faults inside a render are recorded
/// as [`RenderWarning`]s on the returned document.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed template names, config values, CLI variables |
/// | `OperationFailed` | Filesystem I/O, TOML/JSON parsing, lock poisoning |
/// | `CircularTemplate` | An `extends` or `include` chain revisits a template |
/// | `IncludeDepthExceeded` | Nested includes go deeper than the configured limit |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A template inheritance or include chain loops back on itself.
    ///
    /// The chain lists every template visited, ending with the name that
    /// closed the cycle.
    #[error("circular template chain: {}", chain.join(" -> "))]
    CircularTemplate {
        /// Template names in visiting order.
        chain: Vec<String>,
    },

    /// Includes are nested deeper than allowed.
    #[error("include depth {depth} exceeded while including '{name}'")]
    IncludeDepthExceeded {
        /// The template that would have been included.
        name: String,
        /// The configured maximum depth.
        depth: usize,
    },
}

impl Error {
    /// Shorthand for an [`Error::OperationFailed`] built from any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns true if this error reports a template cycle.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::CircularTemplate { .. })
    }
}

/// Result type alias for vaultscribe operations.
pub type Result<T> = std::result::Result<T, Error>;
