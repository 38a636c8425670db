//! TradeFlow Core: orchestration engine for shipment clearance
//!
//! This crate sequences the seven automated stages a trade shipment passes
//! through and derives its final disposition. The stage computations
//! themselves sit behind the [`StageFunctions`] port.
//!
//! ## Key Components
//!
//! - `Orchestrator`: runs the stages in order and publishes each patch
//! - `StageRunner`: agent-state transitions and audit events around one stage
//! - `AgentStateTracker`: the agent roster of one orchestrator
//! - `EventLogger`: the audit event stream
//! - `resolve_disposition`: final status from accumulated results

pub mod disposition;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod logger;
pub mod metrics;
pub mod obs;
pub mod observer;
pub mod orchestrator;
pub mod runner;
pub mod stages;
pub mod store;
pub mod telemetry;
pub mod tracker;

pub use disposition::{explain_disposition, resolve_disposition, Disposition, DispositionReason};
pub use domain::{
    AgentDescriptor, AgentKind, AgentMetrics, AgentStatus, AgentUpdate, ComplianceFinding,
    Document, DocumentExtraction, DocumentType, DutyBreakdown, EventDraft, FactorImpact,
    FindingSeverity, FindingStatus, Goods, HsClassification, IntakeReport, Party,
    ProcessingEvent, RiskAssessment, RiskFactors, RiskLevel, RouteOptimization, Severity,
    ShipmentPatch, ShipmentRecord, ShipmentStatus, ValidationOutcome, ValidationStatus,
};
pub use error::{
    ObserverError, ObserverResult, PipelineError, PipelineResult, StageError, StageResult,
};
pub use logger::EventLogger;
pub use observer::{Listener, Listeners};
pub use orchestrator::{Orchestrator, SYSTEM_AGENT};
pub use runner::StageRunner;
pub use stages::StageFunctions;
pub use store::{EventStore, SharedEventStore, DEFAULT_EVENT_RETENTION};
pub use tracker::AgentStateTracker;

/// TradeFlow version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
