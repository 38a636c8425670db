//! Event Logger: stamps [`EventDraft`]s with identity and time and delivers
//! them synchronously to the event listeners.
//!
//! The logger keeps nothing. Retention is the job of a consuming store such
//! as [`EventStore`](crate::store::EventStore).

use tracing::debug;

use crate::domain::{EventDraft, ProcessingEvent};
use crate::error::{ObserverError, ObserverResult};
use crate::metrics::METRICS;
use crate::observer::EventListeners;

#[derive(Default)]
pub struct EventLogger {
    listeners: EventListeners,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&ProcessingEvent) -> ObserverResult + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener);
    }

    /// Build the event and deliver it before returning it.
    pub fn emit(&self, draft: EventDraft) -> Result<ProcessingEvent, ObserverError> {
        let event = draft.into_event();
        debug!(
            shipment_id = %event.shipment_id,
            stage = %event.stage,
            action = %event.action,
            severity = ?event.severity,
            "processing event"
        );
        METRICS.inc_events_emitted();
        self.listeners.notify(&event)?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentKind, Severity};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_delivers_synchronously() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut logger = EventLogger::new();
        let sink = Arc::clone(&seen);
        logger.subscribe(move |e| {
            sink.lock().unwrap().push(e.clone());
            Ok(())
        });

        let event = logger
            .emit(
                EventDraft::new(
                    "ship-1",
                    AgentKind::Duty,
                    "Duty Calculator Agent",
                    "Calculating Duties",
                    "DE to US",
                )
                .severity(Severity::Success)
                .data(json!({ "total_amount": 12.0 })),
            )
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], event);
        assert_eq!(seen[0].severity, Severity::Success);
        assert_eq!(seen[0].data.as_ref().unwrap()["total_amount"], 12.0);
    }

    #[test]
    fn test_emit_without_listeners() {
        let logger = EventLogger::new();
        let event = logger
            .emit(EventDraft::new("ship-1", AgentKind::Risk, "Risk Scoring Agent", "a", "b"))
            .unwrap();
        assert_eq!(event.severity, Severity::Info);
    }

    #[test]
    fn test_failing_listener_surfaces() {
        let mut logger = EventLogger::new();
        logger.subscribe(|_| Err(ObserverError::Rejected("feed closed".into())));
        let result = logger.emit(EventDraft::new("s", AgentKind::Route, "System", "a", "b"));
        assert!(result.is_err());
    }
}
