//! Traffic and failure notifications
//!
//! Observers subscribe to an [`EventBus`] and receive every frame sent to or
//! received from the device, plus a message for every failed operation.
//! Publishing never blocks and never fails; with no subscriber the event is
//! dropped, and a lagging subscriber loses the oldest events.

use bytes::Bytes;
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Packet bytes handed to the transport (before any TCP envelope)
    Sent(Bytes),

    /// Packet bytes returned by the transport (envelope stripped)
    Received(Bytes),

    /// A public operation failed
    CommandError(String),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) {
        // Err only means nobody is listening
        let _ = self.tx.send(event);
    }

    pub fn sent(&self, bytes: &[u8]) {
        if self.tx.receiver_count() > 0 {
            self.publish(Event::Sent(Bytes::copy_from_slice(bytes)));
        }
    }

    pub fn received(&self, bytes: &[u8]) {
        if self.tx.receiver_count() > 0 {
            self.publish(Event::Received(Bytes::copy_from_slice(bytes)));
        }
    }

    pub fn command_error(&self, message: impl Into<String>) {
        self.publish(Event::CommandError(message.into()));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
