//! Capped in-memory event store.
//!
//! Consumers that want a feed of recent events subscribe a store to the
//! orchestrator's event channel. When full, the oldest event is evicted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::ProcessingEvent;
use crate::error::ObserverResult;

/// Default number of events retained.
pub const DEFAULT_EVENT_RETENTION: usize = 100;

#[derive(Debug, Clone)]
pub struct EventStore {
    events: VecDeque<ProcessingEvent>,
    capacity: usize,
}

impl EventStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_RETENTION)
    }

    /// A store retaining at most `capacity` events. Zero retains nothing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_RETENTION)),
            capacity,
        }
    }

    pub fn push(&mut self, event: ProcessingEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessingEvent> {
        self.events.iter()
    }

    /// Up to `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&ProcessingEvent> {
        self.events.iter().rev().take(limit).collect()
    }

    /// Events of one shipment, oldest first.
    pub fn for_shipment<'a>(
        &'a self,
        shipment_id: &'a str,
    ) -> impl Iterator<Item = &'a ProcessingEvent> + 'a {
        self.events
            .iter()
            .filter(move |e| e.shipment_id == shipment_id)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

/// An [`EventStore`] shared between an event listener and its readers.
#[derive(Debug, Clone, Default)]
pub struct SharedEventStore {
    inner: Arc<Mutex<EventStore>>,
}

impl SharedEventStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventStore::with_capacity(capacity))),
        }
    }

    /// A listener that appends every delivered event to this store.
    pub fn listener(&self) -> impl Fn(&ProcessingEvent) -> ObserverResult + Send + Sync + 'static {
        let inner = Arc::clone(&self.inner);
        move |event: &ProcessingEvent| {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
            Ok(())
        }
    }

    /// Copy of the store as it is now.
    pub fn snapshot(&self) -> EventStore {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
