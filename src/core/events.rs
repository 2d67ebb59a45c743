//! Storage change notifications
//!
//! The EventBus decouples writers of the persistence layer from the readers that
//! mirror persisted values in memory. It uses `tokio::sync::broadcast` so that
//! every open execution context (a browser tab, a second process watching the
//! same file) receives the change as an out-of-band event.
//!
//! # Architecture
//!
//! ```text
//! KeyValueStore::set() ──┐
//!                        ├──▶ EventBus::publish() ──▶ broadcast ──▶ StorageSubscription (tab A)
//! FileStorage watcher ───┘                                     ──▶ StorageSubscription (tab B)
//! ```
//!
//! Each event carries the [`ContextId`] of the context that wrote it, so a
//! subscription can drop its own writes the way a browser never delivers a
//! `storage` event to the tab that caused it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identifies one execution context sharing a storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Allocate a fresh context identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Context used for changes observed from outside the process
    /// (another program rewriting a storage file)
    pub fn external() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_external(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_external() {
            write!(f, "external")
        } else {
            write!(f, "ctx_{}", self.0.simple())
        }
    }
}

/// A change to one key (or to the whole storage) of a key-value backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    /// Changed key; `None` when the whole storage was cleared
    pub key: Option<String>,
    /// Value before the change
    pub old_value: Option<String>,
    /// Value after the change (`None` when removed)
    pub new_value: Option<String>,
    /// Context that performed the write
    pub origin: ContextId,
}

impl StorageEvent {
    /// A single key changed
    pub fn changed(
        key: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
        origin: ContextId,
    ) -> Self {
        Self {
            key: Some(key.into()),
            old_value,
            new_value,
            origin,
        }
    }

    /// Every key was removed at once
    pub fn cleared(origin: ContextId) -> Self {
        Self {
            key: None,
            old_value: None,
            new_value: None,
            origin,
        }
    }

    /// Whether this event may have changed the value stored under `key`
    pub fn affects(&self, key: &str) -> bool {
        match &self.key {
            Some(k) => k == key,
            None => true,
        }
    }
}

/// Envelope wrapping a storage event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: StorageEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: StorageEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus shared by every context of one storage backend
///
/// The bus is cheap to clone (Arc internally) and can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. With no subscribers the event is dropped.
    /// Returns the number of receivers that will receive the event.
    pub fn publish(&self, event: StorageEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
