//! Synchronous, ordered listener lists for the three observation channels:
//! agent-collection updates, shipment patches and processing events.
//!
//! Listeners fire in subscription order, once per notification, on the
//! caller's task. The first listener that returns `Err` stops delivery and
//! the error propagates to the run.

use std::sync::Arc;

use crate::domain::{AgentDescriptor, ProcessingEvent, ShipmentPatch};
use crate::error::ObserverResult;

/// A shareable callback over `T`.
pub type Listener<T> = Arc<dyn Fn(&T) -> ObserverResult + Send + Sync>;

/// Ordered list of listeners over `T`.
pub struct Listeners<T: ?Sized> {
    listeners: Vec<Listener<T>>,
}

impl<T: ?Sized> Listeners<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Append a listener; it will be called after all earlier ones.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&T) -> ObserverResult + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Deliver `value` to every listener in order.
    pub fn notify(&self, value: &T) -> ObserverResult {
        for listener in &self.listeners {
            listener(value)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T: ?Sized> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

/// Channel of full agent-collection snapshots.
pub type AgentListeners = Listeners<[AgentDescriptor]>;

/// Channel of shipment partial patches.
pub type ShipmentListeners = Listeners<ShipmentPatch>;

/// Channel of individual processing events.
pub type EventListeners = Listeners<ProcessingEvent>;
