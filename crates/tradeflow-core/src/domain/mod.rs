//! Domain models for TradeFlow.
//!
//! Canonical definitions for the core entities:
//! - `ShipmentRecord`: the shipment and every stage output accumulated on it
//! - `Document`: an attached trade document and its validation state
//! - `AgentDescriptor`: the state of one named pipeline agent
//! - `ProcessingEvent`: an entry of the audit stream

pub mod agent;
pub mod assessment;
pub mod document;
pub mod event;
pub mod shipment;

pub use agent::{AgentDescriptor, AgentKind, AgentMetrics, AgentStatus, AgentUpdate};
pub use assessment::{
    ComplianceFinding, DutyBreakdown, FactorImpact, FindingSeverity, FindingStatus,
    HsClassification, RiskAssessment, RiskFactors, RiskLevel, RouteOptimization,
};
pub use document::{
    Document, DocumentExtraction, DocumentType, ValidationOutcome, ValidationStatus,
};
pub use event::{EventDraft, ProcessingEvent, Severity};
pub use shipment::{Goods, IntakeReport, Party, ShipmentPatch, ShipmentRecord, ShipmentStatus};
