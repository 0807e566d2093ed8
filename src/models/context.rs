//! Render context: the variable bindings available during a render.

use std::collections::BTreeMap;

use super::Value;

/// Variable bindings for a single render.
///
/// A context is built once per render and is not modified while rendering.
/// Looking up a name that is not bound yields `None`; the renderer turns that
/// into empty text rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    /// Variable values keyed by name.
    values: BTreeMap<String, Value>,
}

impl RenderContext {
    /// Creates a new empty render context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`RenderContext::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Copies every binding of `other` into this context, overriding
    /// existing names.
    pub fn extend(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    /// Gets a top-level value from the context.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Resolves a dotted path such as `ai.summary` or `items.0.name`.
    ///
    /// Map segments look up fields and numeric segments index into lists.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let root = self.values.get(first)?;
        descend(root, segments)
    }

    /// Checks if the context contains a top-level value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over bindings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Returns all bound names in key order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Returns the number of values in the context.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a context from a JSON object.
    ///
    /// RFC 3339 strings become datetimes so that `date_format` works on
    /// contexts read from files. Non-object input yields an empty context.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match Value::from_json(json) {
            Value::Map(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// Returns all values as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Walks the remaining path segments of a dotted lookup.
pub(crate) fn descend<'a, 'p>(
    mut current: &'a Value,
    segments: impl Iterator<Item = &'p str>,
) -> Option<&'a Value> {
    for segment in segments {
        current = match current {
            Value::Map(map) => map.get(segment)?,
            Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RenderContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_context_add_and_get() {
        let mut ctx = RenderContext::new();
        ctx.insert("name", "Alice");
        ctx.insert("count", 42);

        assert_eq!(ctx.get("name"), Some(&Value::from("Alice")));
        assert_eq!(ctx.get("count"), Some(&Value::Int(42)));
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn test_lookup_dotted_paths() {
        let ctx = RenderContext::new()
            .with("ai", Value::map([("summary", "short")]))
            .with("items", Value::list([Value::map([("name", "first")])]));

        assert_eq!(ctx.lookup("ai.summary"), Some(&Value::from("short")));
        assert_eq!(ctx.lookup("items.0.name"), Some(&Value::from("first")));
        assert!(ctx.lookup("items.5.name").is_none());
        assert!(ctx.lookup("ai.summary.deeper").is_none());
        assert!(ctx.lookup("nothing").is_none());
    }

    #[test]
    fn test_render_context_length() {
        let mut ctx = RenderContext::new();
        assert!(ctx.is_empty());
        assert_eq!(ctx.len(), 0);

        ctx.insert("a", "1");
        ctx.insert("b", "2");

        assert!(!ctx.is_empty());
        assert_eq!(ctx.len(), 2);
        assert!(ctx.contains("a"));
        assert!(!ctx.contains("c"));
        assert_eq!(ctx.keys(), vec!["a", "b"]);
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = RenderContext::new().with("a", 1).with("b", 2);
        base.extend(RenderContext::new().with("b", 3));
        assert_eq!(base.get("b"), Some(&Value::Int(3)));
        assert_eq!(base.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_from_json_requires_object() {
        let ctx = RenderContext::from_json(&serde_json::json!({"count": 5}));
        assert_eq!(ctx.get("count"), Some(&Value::Int(5)));

        let empty = RenderContext::from_json(&serde_json::json!([1, 2]));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_from_iterator() {
        let ctx: RenderContext = [("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.to_json(), serde_json::json!({"x": 1, "y": 2}));
    }
}
