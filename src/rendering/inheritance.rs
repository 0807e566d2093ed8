//! Text-level template inheritance: `extends` and `block` merging.
//!
//! Merging keeps the `{{block}}` markers of the parent so that a merged
//! text can itself be extended again.

use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use super::parser::MAX_NESTING_DEPTH;

/// `{{extends "name"}}`, with one trailing line break.
static EXTENDS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*extends\s+["']([^"'{}]+)["']\s*\}\}[ \t]*\r?\n?"#)
        .unwrap_or_else(|_| unreachable!())
});

/// `{{block "name"}}` (group 1) or `{{/block}}`.
static BLOCK_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*(?:block\s+["']([^"'{}]+)["']|/block)\s*\}\}"#)
        .unwrap_or_else(|_| unreachable!())
});

/// Returns the parent named by the first `extends` directive.
pub(crate) fn parent_of(text: &str) -> Option<String> {
    EXTENDS_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Removes every `extends` directive.
pub(crate) fn strip_extends(text: &str) -> String {
    EXTENDS_PATTERN.replace_all(text, "").into_owned()
}

/// A matched `{{block}}...{{/block}}` region.
#[derive(Debug)]
struct BlockSpan {
    name: String,
    body: Range<usize>,
    children: Vec<Self>,
}

/// Finds block regions, nested regions as children.
///
/// Returns `None` when block tags are unbalanced or nested deeper than
/// [`MAX_NESTING_DEPTH`].
fn scan_blocks(text: &str) -> Option<Vec<BlockSpan>> {
    // (name, body start, children collected so far)
    let mut open: Vec<(String, usize, Vec<BlockSpan>)> = Vec::new();
    let mut top = Vec::new();

    for caps in BLOCK_TAG_PATTERN.captures_iter(text) {
        let tag = caps.get(0)?;
        if let Some(name) = caps.get(1) {
            if open.len() >= MAX_NESTING_DEPTH {
                return None;
            }
            open.push((name.as_str().to_string(), tag.end(), Vec::new()));
            continue;
        }
        let (name, start, children) = open.pop()?;
        let span = BlockSpan {
            name,
            body: start..tag.start(),
            children,
        };
        match open.last_mut() {
            Some((_, _, siblings)) => siblings.push(span),
            None => top.push(span),
        }
    }

    open.is_empty().then_some(top)
}

/// Extracts block bodies by name; the first definition of a name wins.
///
/// Returns `None` when block tags are unbalanced.
pub(crate) fn extract_blocks(text: &str) -> Option<BTreeMap<String, String>> {
    fn collect(text: &str, spans: &[BlockSpan], into: &mut BTreeMap<String, String>) {
        for span in spans {
            into.entry(span.name.clone())
                .or_insert_with(|| text[span.body.clone()].to_string());
            collect(text, &span.children, into);
        }
    }

    let spans = scan_blocks(text)?;
    let mut blocks = BTreeMap::new();
    collect(text, &spans, &mut blocks);
    Some(blocks)
}

/// Replaces the body of each parent block that has an override.
///
/// Blocks without an override keep the parent's content, with nested blocks
/// merged recursively. An unbalanced parent is returned unchanged.
pub(crate) fn merge(parent: &str, overrides: &BTreeMap<String, String>) -> String {
    let Some(spans) = scan_blocks(parent) else {
        return parent.to_string();
    };
    let mut merged = String::with_capacity(parent.len());
    merge_range(parent, 0..parent.len(), &spans, overrides, &mut merged);
    merged
}

fn merge_range(
    text: &str,
    range: Range<usize>,
    spans: &[BlockSpan],
    overrides: &BTreeMap<String, String>,
    out: &mut String,
) {
    let mut cursor = range.start;
    for span in spans {
        out.push_str(&text[cursor..span.body.start]);
        match overrides.get(&span.name) {
            Some(body) => out.push_str(body),
            None => merge_range(text, span.body.clone(), &span.children, overrides, out),
        }
        cursor = span.body.end;
    }
    out.push_str(&text[cursor..range.end]);
}

/// Lists the block names defined in a text.
pub(crate) fn block_names(text: &str) -> Vec<String> {
    extract_blocks(text)
        .map(|blocks| blocks.into_keys().collect())
        .unwrap_or_default()
}
