//! Filesystem template store.
//!
//! Templates live as `<dir>/<name>.md`, typically the vault's
//! `99_Meta/Templates` folder.
//!
//! # Security
//!
//! - **Path traversal**: names are validated before being joined to the
//!   directory
//! - **File size limits**: templates larger than [`MAX_TEMPLATE_SIZE`] are
//!   rejected

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::traits::{TemplateSource, TemplateStore};
use super::validate_template_name;
use crate::{Error, Result};

/// Template file extension.
const TEMPLATE_EXTENSION: &str = "md";

/// Maximum template file size (1MB).
pub const MAX_TEMPLATE_SIZE: u64 = 1024 * 1024;

/// Template store backed by a directory of Markdown files.
#[derive(Debug, Clone)]
pub struct FilesystemTemplateStore {
    base_path: PathBuf,
}

impl FilesystemTemplateStore {
    /// Creates a store over a directory that may not exist yet.
    ///
    /// Reads from a missing directory find nothing; the first write creates
    /// it.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Creates a store and its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| Error::operation("create_template_dir", e))?;
        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file path for a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid template name.
    pub fn template_path(&self, name: &str) -> Result<PathBuf> {
        validate_template_name(name)?;
        Ok(self
            .base_path
            .join(format!("{name}.{TEMPLATE_EXTENSION}")))
    }

    fn metadata(&self, name: &str) -> Result<Option<(PathBuf, fs::Metadata)>> {
        let path = self.template_path(name)?;
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => Ok(Some((path, metadata))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::operation("read_template_metadata", e)),
        }
    }
}

impl TemplateStore for FilesystemTemplateStore {
    fn read(&self, name: &str) -> Result<Option<TemplateSource>> {
        let Some((path, metadata)) = self.metadata(name)? else {
            return Ok(None);
        };

        if metadata.len() > MAX_TEMPLATE_SIZE {
            return Err(Error::InvalidInput(format!(
                "Template file exceeds maximum size of {MAX_TEMPLATE_SIZE} bytes: {}",
                path.display()
            )));
        }

        let modified = metadata
            .modified()
            .map_err(|e| Error::operation("read_template_mtime", e))?;
        let text = fs::read_to_string(&path).map_err(|e| Error::operation("read_template", e))?;

        tracing::debug!(template = name, path = %path.display(), "Read template source");
        Ok(Some(TemplateSource { text, modified }))
    }

    fn modified(&self, name: &str) -> Result<Option<SystemTime>> {
        self.metadata(name)?
            .map(|(_, metadata)| {
                metadata
                    .modified()
                    .map_err(|e| Error::operation("read_template_mtime", e))
            })
            .transpose()
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&self.base_path).map_err(|e| Error::operation("read_template_dir", e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::operation("read_dir_entry", e))?;
            if let Some(name) = template_name_from_path(&entry.path()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn write(&self, name: &str, text: &str) -> Result<()> {
        let path = self.template_path(name)?;
        fs::create_dir_all(&self.base_path)
            .map_err(|e| Error::operation("create_template_dir", e))?;
        fs::write(&path, text).map_err(|e| Error::operation("write_template", e))?;
        tracing::debug!(template = name, path = %path.display(), "Wrote template");
        Ok(())
    }
}

/// Extracts a template name from a `.md` file path.
fn template_name_from_path(path: &Path) -> Option<String> {
    if path.extension().is_none_or(|ext| ext != TEMPLATE_EXTENSION) || !path.is_file() {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    validate_template_name(stem).ok()?;
    Some(stem.to_string())
}
