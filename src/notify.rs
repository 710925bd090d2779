//! User-facing outcome messages.
//!
//! Components that report outcomes receive a [`NotificationSink`]
//! explicitly; [`LogSink`] is the fallback when no UI is attached.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variant: Variant,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            variant: Variant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            variant: Variant::Destructive,
        }
    }

    pub fn message(&self) -> String {
        match &self.description {
            Some(description) => format!("{}\n{}", self.title, description),
            None => self.title.clone(),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match notification.variant {
            Variant::Default => tracing::info!(
                title = %notification.title,
                description = notification.description.as_deref().unwrap_or_default(),
                "notification"
            ),
            Variant::Destructive => tracing::warn!(
                title = %notification.title,
                description = notification.description.as_deref().unwrap_or_default(),
                "notification"
            ),
        }
    }
}

/// Keeps every notification in memory until drained.
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}
