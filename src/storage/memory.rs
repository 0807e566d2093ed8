//! In-memory template store.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use super::traits::{TemplateSource, TemplateStore};
use super::validate_template_name;
use crate::{Error, Result};

/// Template store held in memory.
///
/// Every write advances a logical clock, so two writes in quick succession
/// always get distinct modification stamps.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<BTreeMap<String, TemplateSource>>,
    clock: AtomicU64,
}

impl MemoryTemplateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from `(name, text)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is invalid.
    pub fn with_templates<'a>(templates: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let store = Self::new();
        for (name, text) in templates {
            store.write(name, text)?;
        }
        Ok(store)
    }

    /// Stores a template with an explicit modification stamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the lock is poisoned.
    pub fn insert_with_modified(&self, name: &str, text: &str, modified: SystemTime) -> Result<()> {
        validate_template_name(name)?;
        self.templates
            .write()
            .map_err(|e| Error::operation("write_memory_store", e))?
            .insert(
                name.to_string(),
                TemplateSource {
                    text: text.to_string(),
                    modified,
                },
            );
        Ok(())
    }

    /// Removes a template, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn remove(&self, name: &str) -> Result<bool> {
        Ok(self
            .templates
            .write()
            .map_err(|e| Error::operation("write_memory_store", e))?
            .remove(name)
            .is_some())
    }

    fn tick(&self) -> SystemTime {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(tick)
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn read(&self, name: &str) -> Result<Option<TemplateSource>> {
        validate_template_name(name)?;
        let templates = self
            .templates
            .read()
            .map_err(|e| Error::operation("read_memory_store", e))?;
        Ok(templates.get(name).cloned())
    }

    fn modified(&self, name: &str) -> Result<Option<SystemTime>> {
        validate_template_name(name)?;
        let templates = self
            .templates
            .read()
            .map_err(|e| Error::operation("read_memory_store", e))?;
        Ok(templates.get(name).map(|source| source.modified))
    }

    fn list(&self) -> Result<Vec<String>> {
        let templates = self
            .templates
            .read()
            .map_err(|e| Error::operation("read_memory_store", e))?;
        Ok(templates.keys().cloned().collect())
    }

    fn write(&self, name: &str, text: &str) -> Result<()> {
        let modified = self.tick();
        self.insert_with_modified(name, text, modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_advance_modified() {
        let store = MemoryTemplateStore::new();
        store.write("a", "one").unwrap();
        let first = store.modified("a").unwrap().unwrap();
        store.write("a", "two").unwrap();
        let second = store.modified("a").unwrap().unwrap();

        assert!(second > first);
        assert_eq!(store.read("a").unwrap().unwrap().text, "two");
    }

    #[test]
    fn test_with_templates_and_list() {
        let store = MemoryTemplateStore::with_templates([("b", "B"), ("a", "A")]).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
        assert!(store.exists("a").unwrap());
        assert!(!store.exists("c").unwrap());
    }

    #[test]
    fn test_remove() {
        let store = MemoryTemplateStore::with_templates([("a", "A")]).unwrap();
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(store.read("a").unwrap().is_none());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let store = MemoryTemplateStore::new();
        assert!(store.write("../x", "x").is_err());
        assert!(store.read("").is_err());
    }
}
