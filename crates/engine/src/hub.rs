// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event hub.
//!
//! Fans change notifications out to any number of subscribers over bounded
//! channels. Publishers never block: when a subscriber's buffer is full the
//! event is dropped for that subscriber and its drop counter incremented.

use sentinel_core::Event;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

struct Subscriber {
    tx: mpsc::Sender<Event>,
    dropped: u64,
}

#[derive(Default)]
struct HubState {
    subscribers: HashMap<u64, Subscriber>,
    next_id: u64,
    closed: bool,
}

/// Process-local broadcaster with bounded per-subscriber queues.
#[derive(Clone, Default)]
pub struct Hub {
    state: Arc<Mutex<HubState>>,
}

/// Handle releasing a subscription. Unsubscribes explicitly via
/// [`Subscription::unsubscribe`] or implicitly on drop.
pub struct Subscription {
    state: Arc<Mutex<HubState>>,
    id: u64,
}

impl Subscription {
    /// Remove this subscriber from the hub and close its channel.
    pub fn unsubscribe(self) {
        // Removal happens in Drop.
    }

    /// Events dropped for this subscriber because its buffer was full.
    pub fn dropped(&self) -> u64 {
        self.state
            .lock()
            .subscribers
            .get(&self.id)
            .map(|s| s.dropped)
            .unwrap_or(0)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.state.lock().subscribers.remove(&self.id);
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber with a bounded buffer (`buffer >= 1`).
    ///
    /// Returns the receive channel and the release handle.
    pub fn subscribe(&self, buffer: usize) -> (mpsc::Receiver<Event>, Subscription) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        if !state.closed {
            state.subscribers.insert(id, Subscriber { tx, dropped: 0 });
        }
        (
            rx,
            Subscription {
                state: Arc::clone(&self.state),
                id,
            },
        )
    }

    /// Non-blocking fan-out. Full subscriber buffers drop the event for
    /// that subscriber only.
    pub fn publish(&self, event: &Event) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        for subscriber in state.subscribers.values_mut() {
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    subscriber.dropped += 1;
                    debug!(kind = %event.kind, "hub subscriber buffer full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver gone; the Subscription drop will reap it.
                }
            }
        }
    }

    /// Close the hub: all subscriber channels close, later publishes are
    /// no-ops.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
