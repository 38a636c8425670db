//! Agent State Tracker: owns the agent roster of one orchestrator and applies
//! partial updates to it.
//!
//! Agents are matched by their stage-type tag, so a tracker holds at most one
//! agent per [`AgentKind`]. Every update notifies the agent listeners with the
//! full collection, even when no agent of that kind exists.

use std::time::Duration;

use tracing::warn;

use crate::domain::{AgentDescriptor, AgentKind, AgentUpdate};
use crate::error::ObserverResult;
use crate::observer::AgentListeners;

pub struct AgentStateTracker {
    agents: Vec<AgentDescriptor>,
    listeners: AgentListeners,
}

impl AgentStateTracker {
    /// Build a tracker from a roster. A later descriptor replaces an earlier
    /// one of the same kind.
    pub fn new(roster: Vec<AgentDescriptor>) -> Self {
        let mut agents: Vec<AgentDescriptor> = Vec::with_capacity(roster.len());
        for agent in roster {
            match agents.iter_mut().find(|a| a.kind == agent.kind) {
                Some(existing) => *existing = agent,
                None => agents.push(agent),
            }
        }
        Self {
            agents,
            listeners: AgentListeners::new(),
        }
    }

    /// The seven pipeline agents plus the reserved learning agent, all idle.
    pub fn standard() -> Self {
        let roster = AgentKind::PIPELINE
            .iter()
            .chain(std::iter::once(&AgentKind::Learning))
            .map(|kind| AgentDescriptor::idle(*kind))
            .collect();
        Self::new(roster)
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&[AgentDescriptor]) -> ObserverResult + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener);
    }

    /// Merge `update` into the agent of `kind` and notify listeners.
    pub fn set_agent_state(&mut self, kind: AgentKind, update: AgentUpdate) -> ObserverResult {
        match self.agents.iter_mut().find(|a| a.kind == kind) {
            Some(agent) => agent.apply(&update),
            None => warn!(agent_kind = %kind, "no agent registered for kind; update dropped"),
        }
        self.listeners.notify(&self.agents)
    }

    /// Fold one stage outcome into the agent's cumulative metrics.
    pub fn record_outcome(
        &mut self,
        kind: AgentKind,
        success: bool,
        elapsed: Duration,
    ) -> ObserverResult {
        let current = self
            .agent(kind)
            .and_then(|a| a.metrics)
            .unwrap_or_default();
        self.set_agent_state(kind, AgentUpdate::metrics(current.record(success, elapsed)))
    }

    pub fn agent(&self, kind: AgentKind) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.kind == kind)
    }

    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }
}

impl Default for AgentStateTracker {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AgentStatus;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_standard_roster() {
        let tracker = AgentStateTracker::standard();
        assert_eq!(tracker.agents().len(), 8);
        assert!(tracker
            .agents()
            .iter()
            .all(|a| a.status == AgentStatus::Idle && a.progress == 0.0));
        assert_eq!(
            tracker.agent(AgentKind::Route).map(|a| a.name.as_str()),
            Some("Route Optimizer")
        );
    }

    #[test]
    fn test_roster_is_keyed_by_kind() {
        let mut replacement = AgentDescriptor::idle(AgentKind::Duty);
        replacement.name = "Tariff Engine".to_string();
        let tracker =
            AgentStateTracker::new(vec![AgentDescriptor::idle(AgentKind::Duty), replacement]);
        assert_eq!(tracker.agents().len(), 1);
        assert_eq!(tracker.agents()[0].name, "Tariff Engine");
    }

    #[test]
    fn test_update_notifies_with_full_collection() {
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = AgentStateTracker::standard();
        let sink = Arc::clone(&snapshots);
        tracker.subscribe(move |agents| {
            sink.lock().unwrap().push(agents.to_vec());
            Ok(())
        });

        tracker
            .set_agent_state(AgentKind::HsCode, AgentUpdate::processing("Classifying"))
            .unwrap();
        tracker
            .set_agent_state(AgentKind::HsCode, AgentUpdate::progress(50.0))
            .unwrap();

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].len(), 8);
        let hs = snapshots[1]
            .iter()
            .find(|a| a.kind == AgentKind::HsCode)
            .unwrap();
        assert_eq!(hs.progress, 50.0);
        assert_eq!(hs.status, AgentStatus::Processing);
    }

    #[test]
    fn test_missing_kind_still_notifies() {
        let calls = Arc::new(Mutex::new(0));
        let mut tracker = AgentStateTracker::new(vec![AgentDescriptor::idle(AgentKind::Risk)]);
        let counter = Arc::clone(&calls);
        tracker.subscribe(move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        tracker
            .set_agent_state(AgentKind::Duty, AgentUpdate::progress(10.0))
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(tracker.agents()[0].progress, 0.0);
    }

    #[test]
    fn test_same_update_twice_is_idempotent() {
        let update = AgentUpdate::completed(Utc::now());
        let mut once = AgentStateTracker::standard();
        once.set_agent_state(AgentKind::Validation, update.clone())
            .unwrap();
        let mut twice = AgentStateTracker::standard();
        twice
            .set_agent_state(AgentKind::Validation, update.clone())
            .unwrap();
        twice.set_agent_state(AgentKind::Validation, update).unwrap();

        assert_eq!(once.agents(), twice.agents());
    }

    #[test]
    fn test_record_outcome_accumulates() {
        let mut tracker = AgentStateTracker::standard();
        tracker
            .record_outcome(AgentKind::Compliance, true, Duration::from_millis(500))
            .unwrap();
        tracker
            .record_outcome(AgentKind::Compliance, true, Duration::from_millis(1500))
            .unwrap();

        let metrics = tracker
            .agent(AgentKind::Compliance)
            .and_then(|a| a.metrics)
            .unwrap();
        assert_eq!(metrics.total_processed, 2);
        assert_eq!(metrics.success_rate, 100.0);
        assert!((metrics.avg_processing_time - 1.0).abs() < 1e-9);
    }
}
