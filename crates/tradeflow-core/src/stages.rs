//! The stage-function port: the seven external computations the orchestrator
//! sequences.
//!
//! Implementations are pluggable. The orchestrator only depends on the
//! input/output contract below; `tradeflow-agents` ships a baseline
//! implementation and [`crate::fakes::FixedStages`] a deterministic one for
//! tests.

use async_trait::async_trait;

use crate::domain::{
    ComplianceFinding, Document, DocumentExtraction, DutyBreakdown, HsClassification,
    RiskAssessment, RouteOptimization, ShipmentRecord, ValidationOutcome,
};
use crate::error::StageResult;

#[async_trait]
pub trait StageFunctions: Send + Sync {
    /// Extract structured fields from one document.
    async fn extract_document(&self, document: &Document) -> StageResult<DocumentExtraction>;

    /// Check one document for completeness and accuracy.
    async fn validate_document(&self, document: &Document) -> StageResult<ValidationOutcome>;

    /// Classify the goods description into an HS-style code.
    async fn classify(&self, goods_description: &str) -> StageResult<HsClassification>;

    /// Compute duty and tax for a classified value moving between two countries.
    async fn calculate_duty(
        &self,
        hs_code: &str,
        value: f64,
        origin: &str,
        destination: &str,
    ) -> StageResult<DutyBreakdown>;

    /// Evaluate the fixed compliance rule set against the shipment.
    async fn check_compliance(
        &self,
        shipment: &ShipmentRecord,
    ) -> StageResult<Vec<ComplianceFinding>>;

    /// Score the shipment's risk.
    async fn score_risk(&self, shipment: &ShipmentRecord) -> StageResult<RiskAssessment>;

    /// Propose a route between two countries for the given goods weight.
    async fn optimize_route(
        &self,
        origin: &str,
        destination: &str,
        weight: f64,
    ) -> StageResult<RouteOptimization>;
}
