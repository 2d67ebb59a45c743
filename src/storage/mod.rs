//! Persistence port and its implementations
//!
//! The favorites store never talks to a concrete backend. It is handed a
//! [`KeyValueStore`]: a small, synchronous string-to-string map with a
//! subscription to changes made by *other* execution contexts.
//!
//! - [`InMemoryStorage`]: process-local map; every `open_context()` handle
//!   behaves like another browser tab on the same origin
//! - [`FileStorage`]: JSON file on disk, optionally polled for changes made
//!   by other processes

pub mod file;
pub mod in_memory;

pub use file::FileStorage;
pub use in_memory::InMemoryStorage;

use crate::core::error::StorageError;
use crate::core::events::{ContextId, EventEnvelope, StorageEvent};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Key-value persistence port
///
/// All operations are synchronous and expected to be fast. Implementations
/// publish a [`StorageEvent`] for every write that changes a value; a
/// subscription only yields events written by other contexts.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to changes made by other contexts
    fn subscribe(&self) -> StorageSubscription;

    /// Identity of this handle, stamped on the events it publishes
    fn context_id(&self) -> ContextId;
}

/// Item yielded by a [`StorageSubscription`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// Another context changed the storage
    Changed(StorageEvent),
    /// The subscription fell behind and `skipped` events were lost
    Lagged { skipped: u64 },
}

/// Receiver of foreign storage changes
///
/// Wraps the backend's broadcast receiver and drops events whose origin is
/// the subscribing context.
pub struct StorageSubscription {
    rx: broadcast::Receiver<EventEnvelope>,
    context: ContextId,
}

impl StorageSubscription {
    pub fn new(rx: broadcast::Receiver<EventEnvelope>, context: ContextId) -> Self {
        Self { rx, context }
    }

    /// Wait for the next foreign change
    ///
    /// Returns `None` once the backend is gone.
    pub async fn recv(&mut self) -> Option<SubscriptionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if envelope.event.origin == self.context => continue,
                Ok(envelope) => return Some(SubscriptionEvent::Changed(envelope.event)),
                Err(RecvError::Lagged(skipped)) => {
                    return Some(SubscriptionEvent::Lagged { skipped });
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    ///
    /// Returns `None` when no foreign change is pending or the backend is gone.
    pub fn try_recv(&mut self) -> Option<SubscriptionEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) if envelope.event.origin == self.context => continue,
                Ok(envelope) => return Some(SubscriptionEvent::Changed(envelope.event)),
                Err(TryRecvError::Lagged(skipped)) => {
                    return Some(SubscriptionEvent::Lagged { skipped });
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn context_id(&self) -> ContextId {
        self.context
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn subscribe(&self) -> StorageSubscription {
        (**self).subscribe()
    }

    fn context_id(&self) -> ContextId {
        (**self).context_id()
    }
}
