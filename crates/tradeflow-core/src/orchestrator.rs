//! Shipment orchestration: runs the seven stages in order, merges each patch
//! into the working record, publishes it, and resolves the disposition.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use crate::disposition::explain_disposition;
use crate::domain::{
    AgentDescriptor, AgentKind, EventDraft, ProcessingEvent, Severity, ShipmentPatch,
    ShipmentRecord, ShipmentStatus,
};
use crate::error::{ObserverResult, PipelineError, PipelineResult};
use crate::logger::EventLogger;
use crate::metrics::METRICS;
use crate::obs;
use crate::observer::ShipmentListeners;
use crate::runner::StageRunner;
use crate::stages::StageFunctions;
use crate::tracker::AgentStateTracker;

/// Agent name on run-level events.
pub const SYSTEM_AGENT: &str = "System";

/// Runs shipments through the pipeline.
///
/// One orchestrator owns one agent tracker; run concurrent shipments on
/// separate orchestrators.
pub struct Orchestrator {
    stages: Arc<dyn StageFunctions>,
    tracker: AgentStateTracker,
    logger: EventLogger,
    shipment_listeners: ShipmentListeners,
}

impl Orchestrator {
    /// An orchestrator with the standard agent roster.
    pub fn new(stages: Arc<dyn StageFunctions>) -> Self {
        Self::with_tracker(stages, AgentStateTracker::standard())
    }

    pub fn with_tracker(stages: Arc<dyn StageFunctions>, tracker: AgentStateTracker) -> Self {
        Self {
            stages,
            tracker,
            logger: EventLogger::new(),
            shipment_listeners: ShipmentListeners::new(),
        }
    }

    /// Subscribe to full agent-collection snapshots.
    pub fn on_agent_update<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&[AgentDescriptor]) -> ObserverResult + Send + Sync + 'static,
    {
        self.tracker.subscribe(listener);
        self
    }

    /// Subscribe to the partial patches published after each stage.
    pub fn on_shipment_update<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&ShipmentPatch) -> ObserverResult + Send + Sync + 'static,
    {
        self.shipment_listeners.subscribe(listener);
        self
    }

    /// Subscribe to individual processing events.
    pub fn on_event<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&ProcessingEvent) -> ObserverResult + Send + Sync + 'static,
    {
        self.logger.subscribe(listener);
        self
    }

    pub fn tracker(&self) -> &AgentStateTracker {
        &self.tracker
    }

    pub fn into_tracker(self) -> AgentStateTracker {
        self.tracker
    }

    /// Process one shipment end to end and return the merged record.
    ///
    /// Publishes one patch per stage and a final status patch. A stage
    /// failure or a failing observer aborts the run; patches already
    /// published stay published.
    #[instrument(
        skip(self, shipment),
        name = "tradeflow.shipment",
        fields(shipment_id = %shipment.id)
    )]
    pub async fn process_shipment(
        &mut self,
        mut shipment: ShipmentRecord,
    ) -> PipelineResult<ShipmentRecord> {
        if shipment.status.is_terminal() {
            return Err(PipelineError::AlreadyFinalized {
                shipment_id: shipment.id,
                status: shipment.status,
            });
        }

        let start = Instant::now();
        shipment.status = ShipmentStatus::Processing;
        obs::emit_run_started(&shipment.id, shipment.documents.len());

        self.logger.emit(EventDraft::new(
            &shipment.id,
            AgentKind::DocumentIntake,
            SYSTEM_AGENT,
            "Processing Started",
            format!(
                "Starting automated processing for shipment {}",
                shipment.reference_number
            ),
        ))?;

        for kind in AgentKind::PIPELINE {
            let patch = StageRunner::new(self.stages.as_ref(), &mut self.tracker, &self.logger)
                .run(kind, &shipment)
                .await?;
            shipment.apply(&patch);
            self.shipment_listeners.notify(&patch)?;
        }

        let disposition = explain_disposition(&shipment);
        let status = disposition.status;
        info!(status = %status, reason = %disposition.reason, "Disposition resolved");

        let closing = ShipmentPatch::final_status(status, Utc::now());
        shipment.apply(&closing);
        self.shipment_listeners.notify(&closing)?;

        let severity = match status {
            ShipmentStatus::Cleared => Severity::Success,
            ShipmentStatus::Rejected => Severity::Error,
            _ => Severity::Warning,
        };
        self.logger.emit(
            EventDraft::new(
                &shipment.id,
                AgentKind::Route,
                SYSTEM_AGENT,
                "Processing Completed",
                format!("Shipment processing completed with status: {status}"),
            )
            .severity(severity)
            .data(json!({
                "final_status": status,
                "reason": disposition.reason.to_string(),
            })),
        )?;

        METRICS.inc_shipments_processed();
        obs::emit_disposition(&shipment.id, status, start.elapsed().as_millis() as u64);

        Ok(shipment)
    }
}
