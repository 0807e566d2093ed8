//! Integration tests for template rendering over an on-disk vault.
#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use vaultscribe::{
    AiAnalysis, Error, FilesystemTemplateStore, MessageData, NoteAssembler, RenderContext,
    RenderWarning, TemplateEngine, Value, VaultFolder, VaultscribeConfig,
};

struct Vault {
    dir: TempDir,
    engine: TemplateEngine,
}

impl Vault {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = VaultscribeConfig::new().with_vault_path(dir.path());
        let engine = TemplateEngine::from_config(&config);
        Self { dir, engine }
    }

    fn templates(&self) -> std::path::PathBuf {
        self.dir.path().join("99_Meta/Templates")
    }

    fn write(&self, name: &str, text: &str) {
        fs::create_dir_all(self.templates()).unwrap();
        fs::write(self.templates().join(format!("{name}.md")), text).unwrap();
    }

    fn touch(&self, name: &str, modified: SystemTime) {
        set_mtime(&self.templates().join(format!("{name}.md")), modified);
    }

    fn render(&self, name: &str, ctx: &RenderContext) -> String {
        self.engine.render(name, ctx).unwrap().unwrap().text
    }
}

fn set_mtime(path: &Path, modified: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

#[test]
fn test_empty_context_renders_variables_empty() {
    let vault = Vault::new();
    vault.write("t", "[{{a}}][{{b.c}}][{{@item}}]");
    assert_eq!(vault.render("t", &RenderContext::new()), "[][][]");
}

#[test]
fn test_block_override_and_default() {
    let vault = Vault::new();
    vault.write("p", "{{block \"x\"}}A{{/block}}");
    vault.write("c", "{{extends \"p\"}}\n{{block \"x\"}}B{{/block}}");
    vault.write("d", "{{extends \"p\"}}\n");

    let ctx = RenderContext::new();
    assert_eq!(vault.render("c", &ctx), "B");
    assert_eq!(vault.render("d", &ctx), "A");
}

#[test]
fn test_inheritance_cycle_names_chain() {
    let vault = Vault::new();
    vault.write("a", "{{extends \"b\"}}{{block \"x\"}}1{{/block}}");
    vault.write("b", "{{extends \"a\"}}{{block \"x\"}}2{{/block}}");

    match vault.engine.render("a", &RenderContext::new()) {
        Err(Error::CircularTemplate { chain }) => assert_eq!(chain, vec!["a", "b", "a"]),
        other => panic!("expected a cycle error, got {other:?}"),
    }
}

#[test]
fn test_conditional_comparison() {
    let vault = Vault::new();
    vault.write("size", "{{#if count > 3}}big{{#else}}small{{/if}}");

    assert_eq!(vault.render("size", &RenderContext::new().with("count", 5)), "big");
    assert_eq!(vault.render("size", &RenderContext::new().with("count", 2)), "small");
}

#[test]
fn test_each_over_mappings() {
    let vault = Vault::new();
    vault.write("list", "{{#each items}}{{@index}}:{{n}} {{/each}}");
    let ctx = RenderContext::new().with(
        "items",
        Value::list([Value::map([("n", "a")]), Value::map([("n", "b")])]),
    );
    assert_eq!(vault.render("list", &ctx), "0:a 1:b ");
}

#[test]
fn test_functions_on_missing_values_render_empty() {
    let vault = Vault::new();
    vault.write(
        "f",
        "[{{truncate(missing, 5)}}][{{number_format(missing, \"currency\")}}]",
    );
    let doc = vault.engine.render("f", &RenderContext::new()).unwrap().unwrap();
    assert_eq!(doc.text, "[][]");
    assert!(!doc.fallback);
}

#[test]
fn test_malformed_tags_fall_back_to_source() {
    let vault = Vault::new();
    let source = "Hello {{#if x}}\n{{/each}}";
    vault.write("broken", source);

    let doc = vault
        .engine
        .render("broken", &RenderContext::new().with("x", true))
        .unwrap()
        .unwrap();
    assert!(doc.fallback);
    assert_eq!(doc.text, source);
    assert!(matches!(doc.warnings[0], RenderWarning::Syntax { .. }));
}

#[test]
fn test_deep_nesting_falls_back_to_source() {
    let vault = Vault::new();
    let depth = 10_000;
    let ifs = format!("{}x{}", "{{#if a}}".repeat(depth), "{{/if}}".repeat(depth));
    let blocks = format!(
        "{{{{extends \"base\"}}}}{}x{}",
        "{{block \"b\"}}".repeat(depth),
        "{{/block}}".repeat(depth)
    );
    vault.write("base", "{{block \"b\"}}base{{/block}}");
    vault.write("ifs", &ifs);
    vault.write("blocks", &blocks);

    let ctx = RenderContext::new().with("a", true);
    let doc = vault.engine.render("ifs", &ctx).unwrap().unwrap();
    assert!(doc.fallback);
    assert_eq!(doc.text, ifs);

    let doc = vault.engine.render("blocks", &ctx).unwrap().unwrap();
    assert!(doc.fallback);
}

#[test]
fn test_changed_source_is_reloaded() {
    let vault = Vault::new();
    let base = SystemTime::now() - Duration::from_secs(3600);

    vault.write("note", "version one");
    vault.touch("note", base);
    assert_eq!(vault.render("note", &RenderContext::new()), "version one");

    vault.write("note", "version two");
    vault.touch("note", base + Duration::from_secs(60));
    assert_eq!(vault.render("note", &RenderContext::new()), "version two");
}

#[test]
fn test_changed_parent_is_reloaded() {
    let vault = Vault::new();
    let base = SystemTime::now() - Duration::from_secs(3600);

    vault.write("layout", "<{{block \"main\"}}{{/block}}>");
    vault.write("page", "{{extends \"layout\"}}{{block \"main\"}}hi{{/block}}");
    vault.touch("layout", base);
    assert_eq!(vault.render("page", &RenderContext::new()), "<hi>");

    vault.write("layout", "[{{block \"main\"}}{{/block}}]");
    vault.touch("layout", base + Duration::from_secs(60));
    assert_eq!(vault.render("page", &RenderContext::new()), "[hi]");
}

#[test]
fn test_unchanged_source_is_served_from_cache() {
    let vault = Vault::new();
    vault.write("cached", "x");
    vault.render("cached", &RenderContext::new());
    vault.render("cached", &RenderContext::new());

    let stats = vault.engine.loader().cache().stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.compiled, 1);
}

#[test]
fn test_missing_template_is_none() {
    let vault = Vault::new();
    assert!(vault.engine.render("absent", &RenderContext::new()).unwrap().is_none());
    assert!(vault.engine.validate("absent").unwrap().is_none());
}

#[test]
fn test_header_is_split_from_body() {
    let vault = Vault::new();
    vault.write(
        "h",
        "---\ntype: idea\nauthor: \"{{author}}\"\n---\n\n\n\n# {{title}}\n",
    );
    let ctx = RenderContext::new().with("author", "Ada").with("title", "T");
    let doc = vault.engine.render("h", &ctx).unwrap().unwrap();

    assert_eq!(doc.header_str("type"), Some("idea"));
    assert_eq!(doc.header_str("author"), Some("Ada"));
    assert_eq!(doc.body, "\n# T\n");
}

#[test]
fn test_concurrent_renders_share_cache() {
    let vault = Vault::new();
    vault.write("shared", "{{#each xs}}{{@item}}{{/each}}");
    let engine = Arc::new(vault.engine.clone());
    let ctx = RenderContext::new().with("xs", Value::list([1, 2, 3]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let ctx = ctx.clone();
            thread::spawn(move || engine.render("shared", &ctx).unwrap().unwrap().text)
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "123");
    }
}

#[test]
fn test_install_defaults_then_assemble_note() {
    let vault = Vault::new();
    let installed = vault.engine.install_defaults().unwrap();
    assert_eq!(installed.len(), 5);
    assert!(vault.templates().join("idea_note.md").exists());

    let message = MessageData::new("Cache compiled templates per chain")
        .with_author("Ada", "ada")
        .with_channel("ideas");
    let analysis = AiAnalysis::new("Chain-aware template cache")
        .with_category("idea", 0.92)
        .with_tags(vec!["rust".to_string(), String::new()])
        .with_key_points(vec!["stamp every parent".to_string()]);

    let assembler = NoteAssembler::new(vault.engine.clone());
    let note = assembler
        .assemble_message("idea_note", &message, Some(&analysis), RenderContext::new())
        .unwrap()
        .unwrap();

    assert_eq!(note.folder, VaultFolder::Ideas);
    assert!(note.relative_path.starts_with("00_Inbox"));
    assert!(note.filename.ends_with("-idea_note.md"));
    assert!(note.body.contains("# Chain-aware template cache"));
    assert!(note.body.contains("- stamp every parent"));
    assert!(note.body.contains("#rust"));
    assert_eq!(note.header["tags"], serde_json::json!(["idea", "idea", "rust"]));
    assert!(note.to_markdown().unwrap().starts_with("---\n"));
}

#[test]
fn test_store_lists_templates_sorted() {
    let vault = Vault::new();
    vault.write("b", "");
    vault.write("a", "");
    fs::write(vault.templates().join("notes.txt"), "").unwrap();

    assert_eq!(vault.engine.list().unwrap(), vec!["a", "b"]);

    let store = FilesystemTemplateStore::new(vault.templates());
    assert_eq!(store.base_path(), vault.templates());
}
