//! Bounded transport event queue
//!
//! Transport callbacks post here from their own context; the device manager
//! task drains it. A full queue drops the event; the periodic sweep keeps the
//! records live regardless.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};

use crate::onewire::TransportEvent;

/// Default queue depth
pub const REQUEST_QUEUE_DEPTH: usize = 8;

/// Queue of transport events awaiting the device manager
pub struct RequestQueue<M: RawMutex, const N: usize = REQUEST_QUEUE_DEPTH> {
    channel: Channel<M, TransportEvent, N>,
}

impl<M: RawMutex, const N: usize> RequestQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without blocking; returns false if the event was dropped
    pub fn post(&self, event: TransportEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!("device request queue full, dropped {:?}", dropped);
                false
            }
        }
    }

    /// Dequeue without waiting
    pub fn try_take(&self) -> Option<TransportEvent> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next event
    pub async fn take(&self) -> TransportEvent {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl<M: RawMutex, const N: usize> Default for RequestQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
