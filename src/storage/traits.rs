//! Template store trait.

use std::time::SystemTime;

use crate::Result;

/// Raw template text with its modification stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// Template text.
    pub text: String,
    /// When the source last changed; cache entries are validated against it.
    pub modified: SystemTime,
}

/// Trait for template sources.
///
/// Stores are shared between concurrent renders and must be `Send + Sync`.
/// A name that does not exist is `Ok(None)`, never an error.
pub trait TemplateStore: Send + Sync {
    /// Reads a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the source cannot be read.
    fn read(&self, name: &str) -> Result<Option<TemplateSource>>;

    /// Returns the modification stamp without reading the text.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the stamp cannot be read.
    fn modified(&self, name: &str) -> Result<Option<SystemTime>>;

    /// Lists template names, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self) -> Result<Vec<String>>;

    /// Creates or replaces a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the write fails.
    fn write(&self, name: &str, text: &str) -> Result<()>;

    /// Checks if a template exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the stamp cannot be read.
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.modified(name)?.is_some())
    }
}
