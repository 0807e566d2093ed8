//! Assembles vault notes from rendered templates.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Local};
use serde_json::{Map, Value as JsonValue};
use tracing::instrument;

use super::context_builder::ContextBuilder;
use super::template_engine::TemplateEngine;
use crate::Result;
use crate::models::{AiAnalysis, MessageData, RenderContext, RenderedDocument, VaultFolder, VaultNote};

/// Header keys holding tag lists.
const TAG_KEYS: &[&str] = &["tags", "ai_tags"];

/// Turns templates into [`VaultNote`]s ready to be written.
///
/// Assembly renders the template, fills in the header fields every note
/// needs (`obsidian_folder`, `created`, `modified`), drops blank tags and
/// picks a file name. New notes always land in the inbox; the
/// `obsidian_folder` header records where they belong.
#[derive(Debug, Clone)]
pub struct NoteAssembler {
    engine: TemplateEngine,
    now: Option<DateTime<FixedOffset>>,
}

impl NoteAssembler {
    /// Creates an assembler over an engine.
    #[must_use]
    pub const fn new(engine: TemplateEngine) -> Self {
        Self { engine, now: None }
    }

    /// Pins "now" to a fixed instant.
    #[must_use]
    pub fn at(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = Some(now);
        self
    }

    /// Returns the engine.
    #[must_use]
    pub const fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Renders `template` and assembles the note.
    ///
    /// Returns `Ok(None)` if the template does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails structurally (invalid name,
    /// template cycle, store failure).
    #[instrument(skip(self, ctx), fields(template = template))]
    pub fn assemble(&self, template: &str, ctx: &RenderContext) -> Result<Option<VaultNote>> {
        let Some(document) = self.engine.render(template, ctx)? else {
            return Ok(None);
        };
        Ok(Some(self.finish(template, &document, ctx)))
    }

    /// Builds the context for a message and assembles the note.
    ///
    /// # Errors
    ///
    /// Same as [`Self::assemble`].
    pub fn assemble_message(
        &self,
        template: &str,
        message: &MessageData,
        analysis: Option<&AiAnalysis>,
        extras: RenderContext,
    ) -> Result<Option<VaultNote>> {
        let mut builder = ContextBuilder::new().with_extras(extras);
        if let Some(now) = self.now {
            builder = builder.at(now);
        }
        self.assemble(template, &builder.build(message, analysis))
    }

    /// Assembles a note from an already rendered document.
    #[must_use]
    pub fn finish(&self, template: &str, document: &RenderedDocument, ctx: &RenderContext) -> VaultNote {
        let now = self.now.unwrap_or_else(|| Local::now().fixed_offset());
        let mut header = document.header.clone();
        let folder = prepare_header(&mut header, now);
        let filename = note_filename(template, ctx, now);

        tracing::info!(template, filename = %filename, folder = %folder, "Assembled note");

        VaultNote {
            relative_path: PathBuf::from(VaultFolder::Inbox.as_str()).join(&filename),
            filename,
            folder,
            header,
            body: document.body.clone(),
        }
    }
}

/// Fills header defaults and returns the folder the note belongs in.
fn prepare_header(header: &mut Map<String, JsonValue>, now: DateTime<FixedOffset>) -> VaultFolder {
    let folder = match header.get("obsidian_folder").and_then(JsonValue::as_str) {
        Some(declared) => VaultFolder::parse(declared).unwrap_or_default(),
        None => {
            let note_type = header
                .get("type")
                .and_then(JsonValue::as_str)
                .unwrap_or("general");
            let folder = VaultFolder::for_note_type(note_type);
            header.insert(
                "obsidian_folder".to_string(),
                JsonValue::from(folder.as_str()),
            );
            folder
        },
    };

    for key in ["created", "modified"] {
        match header.get(key) {
            None | Some(JsonValue::Null) => {
                header.remove(key);
            },
            Some(JsonValue::String(_)) => {},
            Some(other) => {
                let text = other.to_string();
                header.insert(key.to_string(), JsonValue::String(text));
            },
        }
    }
    if !header.contains_key("created") {
        header.insert(
            "created".to_string(),
            JsonValue::String(now.format("%Y-%m-%dT%H:%M:%S%:z").to_string()),
        );
    }
    if !header.contains_key("modified") {
        let created = header.get("created").cloned().unwrap_or(JsonValue::Null);
        header.insert("modified".to_string(), created);
    }

    for key in TAG_KEYS {
        if let Some(JsonValue::Array(tags)) = header.get_mut(*key) {
            tags.retain(|tag| match tag {
                JsonValue::Null => false,
                JsonValue::String(s) => !s.trim().is_empty(),
                _ => true,
            });
        }
    }

    folder
}

/// `filename` from the context, else `<date_ymd>-<template>.md`.
fn note_filename(template: &str, ctx: &RenderContext, now: DateTime<FixedOffset>) -> String {
    let requested = ctx
        .get("filename")
        .map(crate::models::Value::to_display_string)
        .filter(|name| !name.trim().is_empty());

    let name = requested.unwrap_or_else(|| {
        let date = ctx
            .get("date_ymd")
            .map(crate::models::Value::to_display_string)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
        format!("{date}-{template}")
    });

    let name: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    if name.ends_with(".md") {
        name
    } else {
        format!("{name}.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTemplateStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn fixed_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 0)
            .unwrap()
    }

    fn assembler(templates: &[(&str, &str)]) -> NoteAssembler {
        let store = MemoryTemplateStore::with_templates(templates.iter().copied()).unwrap();
        NoteAssembler::new(TemplateEngine::new(Arc::new(store))).at(fixed_now())
    }

    #[test]
    fn test_header_defaults() {
        let assembler = assembler(&[(
            "idea",
            "---\ntype: idea\ntags:\n  - \"idea\"\n  - \"\"\n  - null\n---\n# Body\n",
        )]);
        let note = assembler
            .assemble("idea", &RenderContext::new())
            .unwrap()
            .unwrap();

        assert_eq!(note.folder, VaultFolder::Ideas);
        assert_eq!(note.header["obsidian_folder"], "03_Ideas");
        assert_eq!(note.header["created"], "2024-03-05T09:30:00+00:00");
        assert_eq!(note.header["modified"], note.header["created"]);
        assert_eq!(note.header["tags"], serde_json::json!(["idea"]));
        assert_eq!(note.body, "# Body\n");
    }

    #[test]
    fn test_declared_folder_is_kept() {
        let mut header = Map::new();
        header.insert("type".to_string(), JsonValue::from("idea"));
        header.insert("obsidian_folder".to_string(), JsonValue::from("05_Resources"));
        header.insert("created".to_string(), JsonValue::from(20_240_305));

        let folder = prepare_header(&mut header, fixed_now());
        assert_eq!(folder, VaultFolder::Resources);
        assert_eq!(header["created"], "20240305");
        assert_eq!(header["modified"], "20240305");
    }

    #[test]
    fn test_filename_defaults_to_date_and_template() {
        let assembler = assembler(&[("task_note", "body")]);
        let ctx = RenderContext::new().with("date_ymd", "2024-01-02");
        let note = assembler.assemble("task_note", &ctx).unwrap().unwrap();

        assert_eq!(note.filename, "2024-01-02-task_note.md");
        assert_eq!(note.relative_path, PathBuf::from("00_Inbox/2024-01-02-task_note.md"));
        assert_eq!(note.folder, VaultFolder::Inbox);
    }

    #[test]
    fn test_filename_from_context() {
        let ctx = RenderContext::new().with("filename", "plans/q2");
        assert_eq!(note_filename("t", &ctx, fixed_now()), "plans-q2.md");

        let ctx = RenderContext::new().with("filename", "ready.md");
        assert_eq!(note_filename("t", &ctx, fixed_now()), "ready.md");

        assert_eq!(
            note_filename("t", &RenderContext::new(), fixed_now()),
            "2024-03-05-t.md"
        );
    }

    #[test]
    fn test_assemble_message() {
        let assembler = assembler(&[(
            "idea",
            "---\ntype: idea\n---\n{{content}} by {{author_name}}",
        )]);
        let message = MessageData::new("Use arenas").with_author("Ada", "ada");
        let note = assembler
            .assemble_message("idea", &message, None, RenderContext::new())
            .unwrap()
            .unwrap();

        assert_eq!(note.body, "Use arenas by Ada");
        assert_eq!(note.filename, "2024-03-05-idea.md");
        assert!(note.to_markdown().unwrap().starts_with("---\n"));
    }

    #[test]
    fn test_missing_template() {
        assert!(assembler(&[]).assemble("none", &RenderContext::new()).unwrap().is_none());
    }
}
