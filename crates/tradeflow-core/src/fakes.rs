//! In-memory fakes for the stage port and the observer channels (testing only)
//!
//! Provides `FixedStages`, deterministic stage functions returning configured
//! values, and `RecordingObservers`, which captures every delivery of a run in
//! order.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{
    AgentDescriptor, AgentKind, ComplianceFinding, Document, DocumentExtraction, DutyBreakdown,
    FindingSeverity, FindingStatus, Goods, HsClassification, Party, ProcessingEvent,
    RiskAssessment, RiskFactors, RiskLevel, RouteOptimization, ShipmentPatch, ShipmentRecord,
    ValidationOutcome,
};
use crate::error::{StageError, StageResult};
use crate::orchestrator::Orchestrator;
use crate::stages::StageFunctions;

/// A draft shipment of microcontrollers from Germany to the United States.
pub fn sample_shipment(id: &str) -> ShipmentRecord {
    ShipmentRecord::new(
        id,
        "TF-2024-001",
        Party::new(
            "Acme Components GmbH",
            "Industriestrasse 12, 70565 Stuttgart",
            "DE",
        ),
        Party::new("Harbor Imports LLC", "400 Pier Avenue, Long Beach, CA", "US"),
        Goods {
            description: "Microcontroller units".to_string(),
            quantity: 5000.0,
            unit: "pcs".to_string(),
            value: 120_000.0,
            currency: "USD".to_string(),
            weight: 340.0,
            weight_unit: "kg".to_string(),
        },
    )
}

// ---------------------------------------------------------------------------
// FixedStages
// ---------------------------------------------------------------------------

const RULES: [&str; 4] = [
    "Export Control",
    "Sanctions Screening",
    "Restricted Goods",
    "Value Declaration",
];

/// Factor score that lands the overall score in the given tier.
fn tier_score(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 95.0,
        RiskLevel::Medium => 78.0,
        RiskLevel::High => 60.0,
        RiskLevel::Critical => 40.0,
    }
}

/// Deterministic stage functions.
///
/// By default every document extracts three fields and validates, all four
/// compliance rules pass and the risk tier is `low`.
#[derive(Debug)]
pub struct FixedStages {
    extraction: DocumentExtraction,
    invalid_documents: HashSet<String>,
    compliance: Vec<FindingStatus>,
    risk_level: RiskLevel,
    fail_at: Option<AgentKind>,
    calls: Mutex<Vec<AgentKind>>,
}

impl Default for FixedStages {
    fn default() -> Self {
        let fields = BTreeMap::from([
            ("invoice_number".to_string(), json!("INV-2024-0042")),
            ("total_value".to_string(), json!(120_000.0)),
            ("currency".to_string(), json!("USD")),
        ]);
        Self {
            extraction: DocumentExtraction {
                fields,
                confidence: 96.5,
            },
            invalid_documents: HashSet::new(),
            compliance: vec![FindingStatus::Passed; RULES.len()],
            risk_level: RiskLevel::Low,
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FixedStages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail validation for the document with this id.
    pub fn with_invalid_document(mut self, document_id: &str) -> Self {
        self.invalid_documents.insert(document_id.to_string());
        self
    }

    /// Compliance findings with these statuses, in order.
    pub fn with_compliance(mut self, statuses: &[FindingStatus]) -> Self {
        self.compliance = statuses.to_vec();
        self
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    /// Make the stage of `kind` return [`StageError::Unavailable`].
    pub fn failing_at(mut self, kind: AgentKind) -> Self {
        self.fail_at = Some(kind);
        self
    }

    pub fn extraction(&self) -> &DocumentExtraction {
        &self.extraction
    }

    /// Stage calls made so far, in order. Per-document stages log one call
    /// per document.
    pub fn calls(&self) -> Vec<AgentKind> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, kind: AgentKind) -> StageResult<()> {
        self.calls.lock().unwrap().push(kind);
        if self.fail_at == Some(kind) {
            return Err(StageError::Unavailable(format!("{kind} backend offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl StageFunctions for FixedStages {
    async fn extract_document(&self, _document: &Document) -> StageResult<DocumentExtraction> {
        self.enter(AgentKind::DocumentIntake)?;
        Ok(self.extraction.clone())
    }

    async fn validate_document(&self, document: &Document) -> StageResult<ValidationOutcome> {
        self.enter(AgentKind::Validation)?;
        if self.invalid_documents.contains(&document.id) {
            Ok(ValidationOutcome::invalid(vec![
                "Missing signature".to_string(),
                "Date format incorrect".to_string(),
            ]))
        } else {
            Ok(ValidationOutcome::valid())
        }
    }

    async fn classify(&self, goods_description: &str) -> StageResult<HsClassification> {
        self.enter(AgentKind::HsCode)?;
        Ok(HsClassification {
            code: "8542.31".to_string(),
            description: format!("Processors and controllers ({goods_description})"),
            confidence: 94.0,
            category: "Electronics".to_string(),
        })
    }

    async fn calculate_duty(
        &self,
        hs_code: &str,
        value: f64,
        _origin: &str,
        _destination: &str,
    ) -> StageResult<DutyBreakdown> {
        self.enter(AgentKind::Duty)?;
        let duty_rate = 0.05;
        let duty_amount = value * duty_rate;
        let tax_amount = value * 0.2;
        Ok(DutyBreakdown {
            hs_code: hs_code.to_string(),
            base_value: value,
            duty_rate,
            duty_amount,
            tax_amount,
            total_amount: duty_amount + tax_amount,
            currency: "USD".to_string(),
        })
    }

    async fn check_compliance(
        &self,
        _shipment: &ShipmentRecord,
    ) -> StageResult<Vec<ComplianceFinding>> {
        self.enter(AgentKind::Compliance)?;
        Ok(self
            .compliance
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let rule = RULES
                    .get(i)
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| format!("Rule {}", i + 1));
                ComplianceFinding {
                    id: format!("rule-{}", i + 1),
                    message: format!("{rule} evaluated"),
                    rule,
                    status: *status,
                    severity: FindingSeverity::Medium,
                }
            })
            .collect())
    }

    async fn score_risk(&self, _shipment: &ShipmentRecord) -> StageResult<RiskAssessment> {
        self.enter(AgentKind::Risk)?;
        Ok(RiskAssessment::from_factors(RiskFactors::uniform(
            tier_score(self.risk_level),
        )))
    }

    async fn optimize_route(
        &self,
        origin: &str,
        destination: &str,
        _weight: f64,
    ) -> StageResult<RouteOptimization> {
        self.enter(AgentKind::Route)?;
        Ok(RouteOptimization {
            path: vec![
                origin.to_string(),
                "Rotterdam".to_string(),
                destination.to_string(),
            ],
            estimated_cost: 4200.0,
            estimated_days: 12,
            confidence: 91.0,
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingObservers
// ---------------------------------------------------------------------------

/// One observer delivery.
#[derive(Debug, Clone)]
pub enum Delivery {
    Agents(Vec<AgentDescriptor>),
    Patch(ShipmentPatch),
    Event(ProcessingEvent),
}

/// Records every delivery on all three channels into one timeline.
#[derive(Debug, Clone, Default)]
pub struct RecordingObservers {
    timeline: Arc<Mutex<Vec<Delivery>>>,
}

impl RecordingObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all three channels of `orchestrator`.
    pub fn attach(&self, orchestrator: &mut Orchestrator) {
        let agents = Arc::clone(&self.timeline);
        let patches = Arc::clone(&self.timeline);
        let events = Arc::clone(&self.timeline);
        orchestrator
            .on_agent_update(move |a| {
                agents.lock().unwrap().push(Delivery::Agents(a.to_vec()));
                Ok(())
            })
            .on_shipment_update(move |p| {
                patches.lock().unwrap().push(Delivery::Patch(p.clone()));
                Ok(())
            })
            .on_event(move |e| {
                events.lock().unwrap().push(Delivery::Event(e.clone()));
                Ok(())
            });
    }

    pub fn timeline(&self) -> Vec<Delivery> {
        self.timeline.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<ProcessingEvent> {
        self.timeline()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Event(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub fn patches(&self) -> Vec<ShipmentPatch> {
        self.timeline()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Patch(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn agent_snapshots(&self) -> Vec<Vec<AgentDescriptor>> {
        self.timeline()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Agents(a) => Some(a),
                _ => None,
            })
            .collect()
    }
}
