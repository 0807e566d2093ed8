//! Variable resolution with `{{#each}}` item frames.

use crate::models::{RenderContext, Value, descend};

/// Resolves dotted variable paths to values.
pub trait Lookup {
    /// Returns the value bound to `path`, or `None` when unbound.
    fn lookup_value(&self, path: &str) -> Option<Value>;
}

impl Lookup for RenderContext {
    fn lookup_value(&self, path: &str) -> Option<Value> {
        self.lookup(path).cloned()
    }
}

/// One active iteration.
#[derive(Debug)]
struct Frame {
    item: Value,
    index: usize,
}

/// Lookup scope for a render: the context plus a stack of iteration frames.
///
/// Frames are searched innermost first. Within a frame, fields of a mapping
/// item come first, then `@index`, then `@item`/`this`.
#[derive(Debug)]
pub(crate) struct Scope<'a> {
    context: &'a RenderContext,
    frames: Vec<Frame>,
}

impl<'a> Scope<'a> {
    pub(crate) const fn new(context: &'a RenderContext) -> Self {
        Self {
            context,
            frames: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, item: Value, index: usize) {
        self.frames.push(Frame { item, index });
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    fn lookup_in_frame(frame: &Frame, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;

        if let Some(field) = frame.item.get(first) {
            return descend(field, segments).cloned();
        }
        match first {
            "@index" if path == first => Some(Value::from(frame.index)),
            "@item" | "this" => descend(&frame.item, segments).cloned(),
            _ => None,
        }
    }
}

impl Lookup for Scope<'_> {
    fn lookup_value(&self, path: &str) -> Option<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| Self::lookup_in_frame(frame, path))
            .or_else(|| self.context.lookup_value(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_fields_shadow_context() {
        let ctx = RenderContext::new().with("name", "outer").with("title", "T");
        let mut scope = Scope::new(&ctx);
        scope.push(Value::map([("name", "inner")]), 3);

        assert_eq!(scope.lookup_value("name"), Some(Value::from("inner")));
        assert_eq!(scope.lookup_value("title"), Some(Value::from("T")));
        assert_eq!(scope.lookup_value("@index"), Some(Value::Int(3)));
        assert_eq!(scope.lookup_value("this.name"), Some(Value::from("inner")));

        scope.pop();
        assert_eq!(scope.lookup_value("name"), Some(Value::from("outer")));
        assert_eq!(scope.lookup_value("@index"), None);
    }

    #[test]
    fn test_scalar_item() {
        let ctx = RenderContext::new();
        let mut scope = Scope::new(&ctx);
        scope.push(Value::from("tag"), 0);

        assert_eq!(scope.lookup_value("@item"), Some(Value::from("tag")));
        assert_eq!(scope.lookup_value("this"), Some(Value::from("tag")));
        assert_eq!(scope.lookup_value("missing"), None);
    }

    #[test]
    fn test_nested_frames_fall_through() {
        let ctx = RenderContext::new();
        let mut scope = Scope::new(&ctx);
        scope.push(Value::map([("project", "vault")]), 0);
        scope.push(Value::map([("task", "write")]), 1);

        assert_eq!(scope.lookup_value("task"), Some(Value::from("write")));
        assert_eq!(scope.lookup_value("project"), Some(Value::from("vault")));
        assert_eq!(scope.lookup_value("@index"), Some(Value::Int(1)));
    }
}
