//! Bounded FIFO of events waiting for the next vector.
//!
//! The queue is drained in enqueue order, never re-sorted. Two policies keep
//! that safe on the audio thread:
//!
//! - **Overflow**: a full queue rejects the newest event and hands it back as
//!   `Err`. Storage is reserved up front, so `push` never allocates.
//! - **Ordering**: an event stamped earlier than the one queued before it is
//!   moved forward to that time, so the converter always sees
//!   non-decreasing timestamps within a vector.

use std::collections::VecDeque;

use cadenza_core::GraphError;

use crate::event::Event;

/// Default number of events one vector can hold.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Fixed-capacity event FIFO.
#[derive(Debug, Clone)]
pub struct EventQueue {
    events: VecDeque<Event>,
    capacity: usize,
    last_time: usize,
    rejected: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventQueue {
    /// Create a queue that holds `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            last_time: 0,
            rejected: 0,
        }
    }

    /// Change the capacity. Queued events are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if the storage cannot be reserved.
    pub fn resize(&mut self, capacity: usize) -> Result<(), GraphError> {
        self.clear();
        if capacity > self.events.capacity() {
            self.events
                .try_reserve_exact(capacity)
                .map_err(|_| GraphError::Allocation(capacity))?;
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns the event back if the queue is full.
    pub fn push(&mut self, mut event: Event) -> Result<(), Event> {
        if self.events.len() >= self.capacity {
            self.rejected += 1;
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "event queue full ({} events), rejecting {:?}",
                self.capacity,
                event.kind
            );
            return Err(event);
        }
        if !self.events.is_empty() && event.time < self.last_time {
            event.time = self.last_time;
        }
        self.last_time = event.time;
        self.events.push_back(event);
        Ok(())
    }

    /// Remove the oldest event.
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.events.pop_front();
        if self.events.is_empty() {
            self.last_time = 0;
        }
        event
    }

    /// Drop every queued event.
    pub fn clear(&mut self) {
        self.events.clear();
        self.last_time = 0;
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of queued events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events rejected since construction.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
