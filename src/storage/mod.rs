//! Template storage.
//!
//! Templates are read through the [`TemplateStore`] trait:
//!
//! | Store | Use |
//! |-------|-----|
//! | [`FilesystemTemplateStore`] | `<dir>/<name>.md` files in the vault |
//! | [`MemoryTemplateStore`] | Embedded templates and tests |

mod filesystem;
mod memory;
mod traits;

pub use filesystem::{FilesystemTemplateStore, MAX_TEMPLATE_SIZE};
pub use memory::MemoryTemplateStore;
pub use traits::{TemplateSource, TemplateStore};

use crate::{Error, Result};

/// Maximum template name length.
const MAX_NAME_LENGTH: usize = 128;

/// Validates a template name.
///
/// Names are non-empty, at most 128 characters, and made of letters,
/// digits, `-`, `_` and `.`; they cannot start with `.`. This keeps names
/// from escaping the template directory.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] describing the problem.
pub fn validate_template_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("template name is empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::InvalidInput(format!(
            "template name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.starts_with('.') {
        return Err(Error::InvalidInput(format!(
            "template name cannot start with '.': {name}"
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(Error::InvalidInput(format!(
            "template name contains invalid character {c:?}: {name}"
        )));
    }
    Ok(())
}
