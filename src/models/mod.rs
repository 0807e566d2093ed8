//! Data models for vaultscribe.
//!
//! This module contains the core data structures shared by the rendering
//! engine and the note services.

mod context;
mod document;
mod message;
mod note;
mod validation;
mod value;

pub(crate) use context::descend;
pub use context::RenderContext;
pub use document::{RenderWarning, RenderedDocument};
pub use message::{AiAnalysis, MessageData};
pub use note::{VaultFolder, VaultNote};
pub use validation::{IssueSeverity, ValidationIssue, ValidationResult};
pub use value::{DATETIME_DISPLAY_FORMAT, Value};
pub(crate) use value::format_float;
