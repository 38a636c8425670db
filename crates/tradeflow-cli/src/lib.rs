//! Shipment loading and run driving for the `tradeflow` binary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use tradeflow_agents::{BaselineAgents, BaselineConfig};
use tradeflow_core::{
    AgentDescriptor, Document, EventStore, Goods, Orchestrator, Party, ProcessingEvent, Severity,
    SharedEventStore, ShipmentRecord, DEFAULT_EVENT_RETENTION,
};

/// Shipment as read from a JSON input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentInput {
    /// Defaults to the reference number.
    #[serde(default)]
    pub id: Option<String>,
    pub reference_number: String,
    pub exporter: Party,
    pub importer: Party,
    pub goods: Goods,

    /// Uploaded document file names; types are inferred from the names.
    #[serde(default)]
    pub documents: Vec<String>,
}

impl ShipmentInput {
    pub fn into_record(self) -> ShipmentRecord {
        let id = self.id.unwrap_or_else(|| self.reference_number.clone());
        let mut record = ShipmentRecord::new(
            id.clone(),
            self.reference_number,
            self.exporter,
            self.importer,
            self.goods,
        );
        for file_name in self.documents {
            record.attach(Document::from_upload(id.as_str(), file_name));
        }
        record
    }
}

/// Read and parse a shipment input file.
pub fn load_shipment(path: &Path) -> Result<ShipmentRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read shipment file {}", path.display()))?;
    let input: ShipmentInput = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid shipment JSON in {}", path.display()))?;
    if input.reference_number.trim().is_empty() {
        bail!("Shipment in {} has an empty reference number", path.display());
    }
    Ok(input.into_record())
}

/// The built-in demo shipment.
pub fn demo_shipment() -> ShipmentRecord {
    ShipmentInput {
        id: Some("ship-demo".to_string()),
        reference_number: "TF-2024-DEMO".to_string(),
        exporter: Party::new(
            "Shenzhen Precision Electronics Co.",
            "88 Keyuan Road, Nanshan, Shenzhen",
            "CN",
        ),
        importer: Party::new(
            "Northwind Medical Supply",
            "1200 Harbor Blvd, Oakland, CA",
            "US",
        ),
        goods: Goods {
            description: "Portable ultrasound diagnostic units".to_string(),
            quantity: 40.0,
            unit: "units".to_string(),
            value: 186_000.0,
            currency: "USD".to_string(),
            weight: 520.0,
            weight_unit: "kg".to_string(),
        },
        documents: vec![
            "commercial_invoice_TF-2024-DEMO.pdf".to_string(),
            "packing_list.pdf".to_string(),
            "bill_of_lading.pdf".to_string(),
            "certificate_of_origin.pdf".to_string(),
        ],
    }
    .into_record()
}

/// Options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub latency: Duration,
    pub event_retention: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            event_retention: DEFAULT_EVENT_RETENTION,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub record: ShipmentRecord,
    pub events: EventStore,
    pub agents: Vec<AgentDescriptor>,
}

/// Run a shipment through the baseline agents.
pub async fn run_shipment(shipment: ShipmentRecord, options: &RunOptions) -> Result<RunReport> {
    let agents = BaselineAgents::new(BaselineConfig::default().with_latency(options.latency));
    let store = SharedEventStore::with_capacity(options.event_retention);

    let mut orchestrator = Orchestrator::new(Arc::new(agents));
    orchestrator.on_event(store.listener());

    info!(shipment_id = %shipment.id, documents = shipment.documents.len(), "Running shipment");
    let shipment_id = shipment.id.clone();
    let record = orchestrator
        .process_shipment(shipment)
        .await
        .with_context(|| format!("Processing of shipment {shipment_id} failed"))?;

    Ok(RunReport {
        record,
        events: store.snapshot(),
        agents: orchestrator.tracker().agents().to_vec(),
    })
}

/// One line of the activity feed.
pub fn format_event(event: &ProcessingEvent) -> String {
    let severity = match event.severity {
        Severity::Info => "INFO",
        Severity::Success => "OK",
        Severity::Warning => "WARN",
        Severity::Error => "ERROR",
    };
    format!(
        "{} {:<5} {}: {} - {}",
        event.timestamp.format("%H:%M:%S"),
        severity,
        event.agent_name,
        event.action,
        event.detail
    )
}

/// One line per agent with its status and metrics.
pub fn format_agent(agent: &AgentDescriptor) -> String {
    let status = agent.status.as_str();
    match agent.metrics {
        Some(m) => format!(
            "{:<24} {:<10} runs={} success={:.0}% avg={:.3}s",
            agent.name, status, m.total_processed, m.success_rate, m.avg_processing_time
        ),
        None => format!("{:<24} {:<10}", agent.name, status),
    }
}
