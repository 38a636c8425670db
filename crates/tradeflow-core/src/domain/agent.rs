//! Agent descriptors and the partial updates applied to them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage-type tag of an agent.
///
/// Seven kinds map one-to-one onto pipeline stages; `Learning` is reserved
/// and never scheduled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    DocumentIntake,
    Validation,
    HsCode,
    Duty,
    Compliance,
    Risk,
    Route,
    Learning,
}

impl AgentKind {
    /// Fixed execution order of the pipeline.
    pub const PIPELINE: [AgentKind; 7] = [
        AgentKind::DocumentIntake,
        AgentKind::Validation,
        AgentKind::HsCode,
        AgentKind::Duty,
        AgentKind::Compliance,
        AgentKind::Risk,
        AgentKind::Route,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::DocumentIntake => "document_intake",
            AgentKind::Validation => "validation",
            AgentKind::HsCode => "hs_code",
            AgentKind::Duty => "duty",
            AgentKind::Compliance => "compliance",
            AgentKind::Risk => "risk",
            AgentKind::Route => "route",
            AgentKind::Learning => "learning",
        }
    }

    /// Display name used in events and the standard roster.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::DocumentIntake => "Document Intake Agent",
            AgentKind::Validation => "Validation Agent",
            AgentKind::HsCode => "HS Code Agent",
            AgentKind::Duty => "Duty Calculator Agent",
            AgentKind::Compliance => "Compliance Agent",
            AgentKind::Risk => "Risk Scoring Agent",
            AgentKind::Route => "Route Optimizer",
            AgentKind::Learning => "Learning Agent",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an agent within a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Processing => "processing",
            AgentStatus::Completed => "completed",
            AgentStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative per-agent figures across runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentMetrics {
    pub total_processed: u64,

    /// Percentage of runs that completed, 0-100.
    pub success_rate: f64,

    /// Mean stage duration in seconds.
    pub avg_processing_time: f64,
}

impl AgentMetrics {
    /// Fold one more stage outcome into the running figures.
    pub fn record(&self, success: bool, elapsed: Duration) -> Self {
        let previous = self.total_processed as f64;
        let total = previous + 1.0;
        let successes = self.success_rate / 100.0 * previous + if success { 1.0 } else { 0.0 };
        Self {
            total_processed: self.total_processed + 1,
            success_rate: successes / total * 100.0,
            avg_processing_time: (self.avg_processing_time * previous + elapsed.as_secs_f64())
                / total,
        }
    }
}

/// State of one named agent, owned by the
/// [`AgentStateTracker`](crate::tracker::AgentStateTracker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,

    #[serde(rename = "type")]
    pub kind: AgentKind,

    pub status: AgentStatus,

    /// Progress, 0-100. Callers keep it within range.
    pub progress: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<AgentMetrics>,
}

impl AgentDescriptor {
    /// An idle agent with the standard display name for its kind.
    pub fn idle(kind: AgentKind) -> Self {
        Self {
            id: format!("agent-{}", kind.as_str()),
            name: kind.display_name().to_string(),
            kind,
            status: AgentStatus::Idle,
            progress: 0.0,
            current_task: None,
            last_run: None,
            metrics: None,
        }
    }

    /// Merge the set fields of `update` into this descriptor.
    pub fn apply(&mut self, update: &AgentUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(task) = &update.current_task {
            self.current_task = Some(task.clone());
        }
        if let Some(last_run) = update.last_run {
            self.last_run = Some(last_run);
        }
        if let Some(metrics) = update.metrics {
            self.metrics = Some(metrics);
        }
    }
}

/// Partial update of an agent; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentUpdate {
    pub status: Option<AgentStatus>,
    pub progress: Option<f64>,
    pub current_task: Option<String>,
    pub last_run: Option<DateTime<Utc>>,
    pub metrics: Option<AgentMetrics>,
}

impl AgentUpdate {
    /// Enter `processing` at progress 0 with a task label.
    pub fn processing(task: impl Into<String>) -> Self {
        Self {
            status: Some(AgentStatus::Processing),
            progress: Some(0.0),
            current_task: Some(task.into()),
            ..Self::default()
        }
    }

    pub fn progress(progress: f64) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Enter `completed` at progress 100, stamping the run time.
    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(AgentStatus::Completed),
            progress: Some(100.0),
            last_run: Some(at),
            ..Self::default()
        }
    }

    /// Enter `error`, stamping the run time. Progress is left where it stopped.
    pub fn failed(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(AgentStatus::Error),
            last_run: Some(at),
            ..Self::default()
        }
    }

    pub fn metrics(metrics: AgentMetrics) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::default()
        }
    }
}
