use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::trace;

use crate::Config;

/// Feedback events raised by feeds and mutation call sites.
#[derive(Clone, PartialEq, Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Track {
        event: String,
        properties: Map<String, Value>,
    },
    Page {
        path: String,
    },
    Identify {
        user_id: Option<String>,
        properties: Map<String, Value>,
    },
    Toast {
        level: ToastLevel,
        message: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

impl FeedEvent {
    pub fn track<'a>(
        event: impl Into<String>,
        properties: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Self {
        Self::Track {
            event: event.into(),
            properties: properties
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }

    pub fn toast(level: ToastLevel, message: impl Into<String>) -> Self {
        Self::Toast {
            level,
            message: message.into(),
        }
    }
}

/// Receiver of [FeedEvent]s, injected into whatever raises them.
#[cfg_attr(feature = "unimock", unimock::unimock(api = EventSinkMock))]
pub trait EventSink: Send + Sync {
    fn emit(&self, event: FeedEvent);
}

/// An [EventSink] in an [Arc].
pub type ArcEventSink = Arc<dyn EventSink>;

/// Fan-out [EventSink] delivering every event to all current subscribers.
///
/// Events emitted while nobody subscribes are dropped.
pub struct EventBus {
    sender: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.event_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: FeedEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(?event, "no event subscribers");
        }
    }
}
