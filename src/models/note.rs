//! Vault notes and the folder layout they are filed into.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::{Error, Result};

/// Top-level folders of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum VaultFolder {
    /// Unsorted captures.
    #[default]
    Inbox,
    /// Projects and tasks in flight.
    Projects,
    /// One note per day.
    DailyNotes,
    /// Ideas.
    Ideas,
    /// Retired notes.
    Archive,
    /// Reference material.
    Resources,
    /// Finance records.
    Finance,
    /// Task records.
    Tasks,
    /// Health records.
    Health,
    /// Knowledge base, meeting notes.
    Knowledge,
    /// Vault metadata.
    Meta,
    /// Note templates.
    Templates,
}

impl VaultFolder {
    /// Returns the folder path relative to the vault root.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "00_Inbox",
            Self::Projects => "01_Projects",
            Self::DailyNotes => "02_DailyNotes",
            Self::Ideas => "03_Ideas",
            Self::Archive => "04_Archive",
            Self::Resources => "05_Resources",
            Self::Finance => "06_Finance",
            Self::Tasks => "07_Tasks",
            Self::Health => "08_Health",
            Self::Knowledge => "09_Knowledge",
            Self::Meta => "99_Meta",
            Self::Templates => "99_Meta/Templates",
        }
    }

    /// Returns all folders.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Inbox,
            Self::Projects,
            Self::DailyNotes,
            Self::Ideas,
            Self::Archive,
            Self::Resources,
            Self::Finance,
            Self::Tasks,
            Self::Health,
            Self::Knowledge,
            Self::Meta,
            Self::Templates,
        ]
    }

    /// Parses a folder from its path form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_end_matches('/');
        Self::all().iter().copied().find(|f| f.as_str() == s)
    }

    /// Chooses the folder for a note `type` header value.
    #[must_use]
    pub fn for_note_type(note_type: &str) -> Self {
        match note_type.trim().to_lowercase().as_str() {
            "idea" => Self::Ideas,
            "task" => Self::Projects,
            "meeting" => Self::Knowledge,
            "daily" => Self::DailyNotes,
            _ => Self::Inbox,
        }
    }
}

impl fmt::Display for VaultFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note ready to be written into the vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultNote {
    /// File name including the `.md` extension.
    pub filename: String,
    /// Path relative to the vault root.
    pub relative_path: PathBuf,
    /// Folder the header asks the note to be filed into.
    pub folder: VaultFolder,
    /// Header fields.
    pub header: serde_json::Map<String, serde_json::Value>,
    /// Markdown body.
    pub body: String,
}

impl VaultNote {
    /// Serialises the note as Markdown with a YAML header block.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be serialised.
    pub fn to_markdown(&self) -> Result<String> {
        if self.header.is_empty() {
            return Ok(self.body.clone());
        }

        let yaml = serde_yaml_ng::to_string(&self.header)
            .map_err(|e| Error::operation("serialize_header", e))?;

        Ok(format!("---\n{yaml}---\n{}", self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_for_note_type() {
        assert_eq!(VaultFolder::for_note_type("idea"), VaultFolder::Ideas);
        assert_eq!(VaultFolder::for_note_type("Task"), VaultFolder::Projects);
        assert_eq!(VaultFolder::for_note_type("meeting"), VaultFolder::Knowledge);
        assert_eq!(VaultFolder::for_note_type("daily"), VaultFolder::DailyNotes);
        assert_eq!(VaultFolder::for_note_type("general"), VaultFolder::Inbox);
    }

    #[test]
    fn test_folder_parse_roundtrip() {
        for folder in VaultFolder::all() {
            assert_eq!(VaultFolder::parse(folder.as_str()), Some(*folder));
        }
        assert_eq!(VaultFolder::parse("03_Ideas/"), Some(VaultFolder::Ideas));
        assert_eq!(VaultFolder::parse("nope"), None);
    }

    #[test]
    fn test_to_markdown_with_header() {
        let mut header = serde_json::Map::new();
        header.insert("type".to_string(), serde_json::Value::from("idea"));
        let note = VaultNote {
            filename: "x.md".to_string(),
            relative_path: PathBuf::from("00_Inbox/x.md"),
            folder: VaultFolder::Ideas,
            header,
            body: "# Body\n".to_string(),
        };

        let markdown = note.to_markdown().unwrap();
        assert!(markdown.starts_with("---\ntype: idea\n---\n"));
        assert!(markdown.ends_with("# Body\n"));
    }

    #[test]
    fn test_to_markdown_without_header() {
        let note = VaultNote {
            filename: "x.md".to_string(),
            relative_path: PathBuf::from("00_Inbox/x.md"),
            folder: VaultFolder::Inbox,
            header: serde_json::Map::new(),
            body: "plain".to_string(),
        };
        assert_eq!(note.to_markdown().unwrap(), "plain");
    }
}
