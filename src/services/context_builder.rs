//! Builds render contexts from captured messages.

use chrono::{DateTime, FixedOffset, Local};

use crate::models::{AiAnalysis, MessageData, RenderContext, Value};

/// Builds the [`RenderContext`] for a captured message.
///
/// The context carries date keys for "now", the message fields and the AI
/// analysis. Without an analysis the `ai_*` keys are present but empty.
/// Extra values are applied last and override everything else.
///
/// # Example
///
/// ```rust,ignore
/// use vaultscribe::{AiAnalysis, ContextBuilder, MessageData};
///
/// let message = MessageData::new("Try the new parser").with_author("Ada", "ada");
/// let analysis = AiAnalysis::new("Parser idea").with_category("idea", 0.9);
///
/// let ctx = ContextBuilder::new()
///     .with_extra("filename", "parser-idea")
///     .build(&message, Some(&analysis));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    now: Option<DateTime<FixedOffset>>,
    extras: RenderContext,
}

impl ContextBuilder {
    /// Creates a builder using the local clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins "now" to a fixed instant.
    #[must_use]
    pub fn at(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = Some(now);
        self
    }

    /// Adds a value that overrides the built keys.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(name, value);
        self
    }

    /// Adds several override values.
    #[must_use]
    pub fn with_extras(mut self, extras: RenderContext) -> Self {
        self.extras.extend(extras);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(&self, message: &MessageData, analysis: Option<&AiAnalysis>) -> RenderContext {
        let now = self.now.unwrap_or_else(|| Local::now().fixed_offset());
        let mut ctx = RenderContext::new();

        ctx.insert("current_date", now);
        ctx.insert("current_time", now);
        ctx.insert("date_iso", now.format("%Y-%m-%dT%H:%M:%S%:z").to_string());
        ctx.insert("date_ymd", now.format("%Y-%m-%d").to_string());
        ctx.insert("time_hm", now.format("%H:%M").to_string());

        ctx.insert("message_id", message.id);
        ctx.insert("content", message.content.as_str());
        ctx.insert("content_length", message.content.chars().count());
        ctx.insert("author_name", message.author_name.as_str());
        ctx.insert("author_username", message.author_username.as_str());
        ctx.insert("channel_name", message.channel_name.as_str());
        ctx.insert("attachments", message.attachments.clone());
        ctx.insert("attachment_count", message.attachments.len());
        ctx.insert("has_attachments", !message.attachments.is_empty());
        ctx.insert("message_created_at", message.created_at);

        let empty = AiAnalysis::default();
        let ai = analysis.unwrap_or(&empty);
        ctx.insert("ai_processed", analysis.is_some());
        ctx.insert("ai_summary", ai.summary.as_str());
        ctx.insert("ai_key_points", ai.key_points.clone());
        ctx.insert("ai_tags", ai.tags.clone());
        ctx.insert("ai_category", ai.category.as_str());
        ctx.insert("ai_confidence", ai.confidence);
        ctx.insert("ai_reasoning", ai.reasoning.as_str());
        ctx.insert("processing_time", ai.processing_time_ms);

        ctx.extend(self.extras.clone());
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_date_keys() {
        let ctx = ContextBuilder::new()
            .at(fixed_now())
            .build(&MessageData::default(), None);

        assert_eq!(ctx.get("date_ymd"), Some(&Value::from("2024-03-05")));
        assert_eq!(ctx.get("time_hm"), Some(&Value::from("09:30")));
        assert_eq!(
            ctx.get("date_iso"),
            Some(&Value::from("2024-03-05T09:30:00+09:00"))
        );
        assert_eq!(ctx.get("current_date"), Some(&Value::DateTime(fixed_now())));
    }

    #[test]
    fn test_message_keys() {
        let message = MessageData::new("héllo")
            .with_id(42)
            .with_author("Ada", "ada")
            .with_channel("ideas")
            .with_attachments(vec!["a.png".to_string()]);
        let ctx = ContextBuilder::new().at(fixed_now()).build(&message, None);

        assert_eq!(ctx.get("message_id"), Some(&Value::Int(42)));
        assert_eq!(ctx.get("content_length"), Some(&Value::Int(5)));
        assert_eq!(ctx.get("author_username"), Some(&Value::from("ada")));
        assert_eq!(ctx.get("attachment_count"), Some(&Value::Int(1)));
        assert_eq!(ctx.get("has_attachments"), Some(&Value::Bool(true)));
        assert_eq!(ctx.get("message_created_at"), Some(&Value::Null));
    }

    #[test]
    fn test_without_analysis_ai_keys_are_empty() {
        let ctx = ContextBuilder::new().build(&MessageData::default(), None);

        assert_eq!(ctx.get("ai_processed"), Some(&Value::Bool(false)));
        assert_eq!(ctx.get("ai_summary"), Some(&Value::from("")));
        assert_eq!(ctx.get("ai_tags"), Some(&Value::List(Vec::new())));
        assert_eq!(ctx.get("ai_confidence"), Some(&Value::Float(0.0)));
        assert_eq!(ctx.get("processing_time"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_with_analysis() {
        let analysis = AiAnalysis::new("A parser idea")
            .with_category("idea", 0.875)
            .with_tags(vec!["rust".to_string()]);
        let ctx = ContextBuilder::new().build(&MessageData::default(), Some(&analysis));

        assert_eq!(ctx.get("ai_processed"), Some(&Value::Bool(true)));
        assert_eq!(ctx.get("ai_category"), Some(&Value::from("idea")));
        assert_eq!(ctx.get("ai_tags"), Some(&Value::list(["rust"])));
    }

    #[test]
    fn test_extras_override() {
        let ctx = ContextBuilder::new()
            .with_extra("content", "overridden")
            .with_extra("filename", "custom")
            .build(&MessageData::new("original"), None);

        assert_eq!(ctx.get("content"), Some(&Value::from("overridden")));
        assert_eq!(ctx.get("filename"), Some(&Value::from("custom")));
    }
}
