//! Structured observability hooks for the shipment run lifecycle.
//!
//! This module provides:
//! - Emission functions for key lifecycle events: run start, stage start,
//!   stage completion, stage failure and disposition
//!
//! Events are emitted at `info!` level (`warn!` for failures). Configure the
//! filter with `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

use crate::domain::{AgentKind, ShipmentStatus};

/// Emit event: run started for a shipment with its document count.
pub fn emit_run_started(shipment_id: &str, documents: usize) {
    info!(event = "shipment.run_started", shipment_id = %shipment_id, documents = documents);
}

pub fn emit_stage_started(shipment_id: &str, stage: AgentKind) {
    info!(event = "shipment.stage_started", shipment_id = %shipment_id, stage = %stage);
}

/// Emit event: stage completed with its duration.
pub fn emit_stage_completed(shipment_id: &str, stage: AgentKind, duration_ms: u64) {
    info!(
        event = "shipment.stage_completed",
        shipment_id = %shipment_id,
        stage = %stage,
        duration_ms = duration_ms,
    );
}

/// Emit event: stage function failed (warning level).
pub fn emit_stage_failed(shipment_id: &str, stage: AgentKind, error: &dyn std::fmt::Display) {
    warn!(
        event = "shipment.stage_failed",
        shipment_id = %shipment_id,
        stage = %stage,
        error = %error,
    );
}

/// Emit event: final disposition with total run duration.
pub fn emit_disposition(shipment_id: &str, status: ShipmentStatus, duration_ms: u64) {
    info!(
        event = "shipment.disposition",
        shipment_id = %shipment_id,
        status = %status,
        duration_ms = duration_ms,
    );
}
