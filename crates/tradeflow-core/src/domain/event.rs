//! Audit events emitted during a shipment run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentKind;

/// Severity of a processing event.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// A single immutable entry of the audit stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingEvent {
    pub id: Uuid,
    pub shipment_id: String,

    /// Stage-type tag of the emitting agent.
    pub stage: AgentKind,

    pub agent_name: String,
    pub timestamp: DateTime<Utc>,

    /// Short action label, e.g. "Validation Passed".
    pub action: String,

    pub detail: String,
    pub severity: Severity,

    /// Optional structured payload (a JSON object).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Everything needed to emit an event; identity and timestamp are assigned
/// by the [`EventLogger`](crate::logger::EventLogger).
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub shipment_id: String,
    pub stage: AgentKind,
    pub agent_name: String,
    pub action: String,
    pub detail: String,
    pub severity: Severity,
    pub data: Option<serde_json::Value>,
}

impl EventDraft {
    /// An `info` event with no payload.
    pub fn new(
        shipment_id: impl Into<String>,
        stage: AgentKind,
        agent_name: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            shipment_id: shipment_id.into(),
            stage,
            agent_name: agent_name.into(),
            action: action.into(),
            detail: detail.into(),
            severity: Severity::Info,
            data: None,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub(crate) fn into_event(self) -> ProcessingEvent {
        ProcessingEvent {
            id: Uuid::new_v4(),
            shipment_id: self.shipment_id,
            stage: self.stage,
            agent_name: self.agent_name,
            timestamp: Utc::now(),
            action: self.action,
            detail: self.detail,
            severity: self.severity,
            data: self.data,
        }
    }
}
