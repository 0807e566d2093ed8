//! Inputs describing a note-worthy event: a chat message and its analysis.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A chat message captured for the vault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    /// Platform message identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Raw message text.
    #[serde(default)]
    pub content: String,
    /// Author display name.
    #[serde(default)]
    pub author_name: String,
    /// Author account name.
    #[serde(default)]
    pub author_username: String,
    /// Channel the message was posted in.
    #[serde(default)]
    pub channel_name: String,
    /// Attachment file names or URLs.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// When the message was posted.
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl MessageData {
    /// Creates a message with the given content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Sets the message identifier.
    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the author display and account names.
    #[must_use]
    pub fn with_author(mut self, name: impl Into<String>, username: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_username = username.into();
        self
    }

    /// Sets the channel name.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel_name = channel.into();
        self
    }

    /// Sets the attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the posting time.
    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<FixedOffset>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// AI summarisation and classification of a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    /// Short summary.
    #[serde(default)]
    pub summary: String,
    /// Bullet points extracted from the message.
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Suggested tags, without `#`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category label, e.g. `idea` or `task`.
    #[serde(default)]
    pub category: String,
    /// Classifier confidence between 0 and 1.
    #[serde(default)]
    pub confidence: f64,
    /// Classifier explanation.
    #[serde(default)]
    pub reasoning: String,
    /// Total processing time in milliseconds.
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl AiAnalysis {
    /// Creates an analysis with a summary.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Sets the category and confidence.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>, confidence: f64) -> Self {
        self.category = category.into();
        self.confidence = confidence;
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the key points.
    #[must_use]
    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = key_points;
        self
    }
}
