//! Hand-off of key events from the scanner to the dispatcher.
//!
//! A bounded [`Channel`] carries [`PackedKeyEvent`]s. The scanner holds the only [`EventProducer`] and the dispatcher the
//! only [`EventConsumer`]; each event moves from one to the other by value. The producer never waits: when the queue is
//! full the new event is dropped and counted.

use crate::key::{KeyEvent, PackedKeyEvent};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

/// Number of events the queue holds before the producer starts dropping them.
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// The queue itself; typically a `static`.
pub type KeyEventChannel<const N: usize = EVENT_QUEUE_DEPTH> =
    Channel<CriticalSectionRawMutex, PackedKeyEvent, N>;

/// Scanner side of the queue.
pub struct EventProducer<'a, const N: usize = EVENT_QUEUE_DEPTH> {
    channel: &'a KeyEventChannel<N>,
    dropped: u32,
}

impl<'a, const N: usize> EventProducer<'a, N> {
    /// Constructs an `EventProducer`.
    pub fn new(channel: &'a KeyEventChannel<N>) -> Self {
        Self {
            channel,
            dropped: 0,
        }
    }

    /// Enqueues an event without waiting. Returns `false` if the queue was full and the event was dropped.
    pub fn push(&mut self, event: KeyEvent) -> bool {
        match self.channel.try_send(event.pack()) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!(
                    "Key event queue is full, dropped {} (total dropped: {})",
                    event, self.dropped
                );
                false
            }
        }
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

/// Dispatcher side of the queue.
pub struct EventConsumer<'a, const N: usize = EVENT_QUEUE_DEPTH> {
    channel: &'a KeyEventChannel<N>,
}

impl<'a, const N: usize> EventConsumer<'a, N> {
    /// Constructs an `EventConsumer`.
    pub fn new(channel: &'a KeyEventChannel<N>) -> Self {
        Self { channel }
    }

    /// Returns `true` if at least one event is waiting.
    pub fn ready(&self) -> bool {
        !self.channel.is_empty()
    }

    /// Dequeues the oldest event, if any, without waiting.
    pub fn try_pop(&mut self) -> Option<PackedKeyEvent> {
        self.channel.try_receive().ok()
    }

    /// Dequeues the oldest event, waiting for one to arrive if the queue is empty.
    pub async fn pop(&mut self) -> PackedKeyEvent {
        self.channel.receive().await
    }
}
