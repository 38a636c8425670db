//! Baseline stage functions.
//!
//! Every output is drawn from a [`Seed`] over the stage input, so a given
//! shipment always produces the same classification, duty, findings, risk
//! and route. Value ranges follow the placeholder models the pipeline was
//! prototyped with.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use tradeflow_core::{
    ComplianceFinding, Document, DocumentExtraction, DutyBreakdown, HsClassification,
    RiskAssessment, RiskFactors, RouteOptimization, ShipmentRecord, StageError, StageFunctions,
    StageResult, ValidationOutcome,
};

use crate::catalog::{COMPLIANCE_RULES, HS_HEADINGS};
use crate::config::BaselineConfig;
use crate::seed::Seed;

/// Share of documents the baseline validator rejects.
const INVALID_DOCUMENT_RATE: f64 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct BaselineAgents {
    config: BaselineConfig,
}

impl BaselineAgents {
    pub fn new(config: BaselineConfig) -> Self {
        Self { config }
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[async_trait]
impl StageFunctions for BaselineAgents {
    async fn extract_document(&self, document: &Document) -> StageResult<DocumentExtraction> {
        if document.file_name.trim().is_empty() {
            return Err(StageError::InvalidInput(format!(
                "document {} has no file name",
                document.id
            )));
        }
        self.simulate_latency().await;

        let seed = Seed::new("intake", &[document.id.as_str(), document.file_name.as_str()]);
        let fields = BTreeMap::from([
            (
                "invoice_number".to_string(),
                json!(format!("INV-{}", seed.tag(9))),
            ),
            (
                "date".to_string(),
                json!(document.uploaded_at.format("%Y-%m-%d").to_string()),
            ),
            (
                "total_value".to_string(),
                json!(seed.pick(0, 50_000, 500_000)),
            ),
            ("items".to_string(), json!(seed.pick(1, 1, 20))),
        ]);
        let extraction = DocumentExtraction {
            fields,
            confidence: round_to(seed.range(2, 92.0, 7.0), 1),
        };
        debug!(document_id = %document.id, fields = extraction.field_count(), "Document extracted");
        Ok(extraction)
    }

    async fn validate_document(&self, document: &Document) -> StageResult<ValidationOutcome> {
        self.simulate_latency().await;

        let seed = Seed::new("validation", &[document.id.as_str()]);
        let outcome = if seed.unit(0) < INVALID_DOCUMENT_RATE {
            ValidationOutcome::invalid(vec![
                "Missing required field: Exporter Tax ID".to_string(),
                "Invalid date format".to_string(),
            ])
        } else {
            ValidationOutcome::valid()
        };
        debug!(document_id = %document.id, valid = outcome.valid, "Document validated");
        Ok(outcome)
    }

    async fn classify(&self, goods_description: &str) -> StageResult<HsClassification> {
        if goods_description.trim().is_empty() {
            return Err(StageError::InvalidInput(
                "goods description is empty".to_string(),
            ));
        }
        self.simulate_latency().await;

        let normalized = goods_description.trim().to_lowercase();
        let seed = Seed::new("hs_code", &[normalized.as_str()]);
        let index = seed.pick(0, 0, HS_HEADINGS.len() as u64) as usize;
        let heading = HS_HEADINGS[index.min(HS_HEADINGS.len() - 1)];

        Ok(HsClassification {
            code: heading.code.to_string(),
            description: heading.description.to_string(),
            confidence: round_to(seed.range(1, 88.0, 10.0), 1),
            category: heading.category.to_string(),
        })
    }

    async fn calculate_duty(
        &self,
        hs_code: &str,
        value: f64,
        origin: &str,
        destination: &str,
    ) -> StageResult<DutyBreakdown> {
        if !value.is_finite() || value < 0.0 {
            return Err(StageError::InvalidInput(format!(
                "declared value must be a non-negative amount, got {value}"
            )));
        }
        self.simulate_latency().await;

        // Rate keyed by heading and lane, 0-15%.
        let seed = Seed::new("duty", &[hs_code, origin, destination]);
        let duty_rate = seed.range(0, 0.0, 0.15);
        let duty_amount = value * duty_rate;
        let tax_amount = value * self.config.tax_rate;

        Ok(DutyBreakdown {
            hs_code: hs_code.to_string(),
            base_value: value,
            duty_rate: round_to(duty_rate, 2),
            duty_amount: duty_amount.round(),
            tax_amount: tax_amount.round(),
            total_amount: (duty_amount + tax_amount).round(),
            currency: self.config.currency.clone(),
        })
    }

    async fn check_compliance(
        &self,
        shipment: &ShipmentRecord,
    ) -> StageResult<Vec<ComplianceFinding>> {
        self.simulate_latency().await;

        let seed = Seed::new("compliance", &[shipment.id.as_str()]);
        let findings = COMPLIANCE_RULES
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let (status, message) = rule.evaluate(seed.unit(i));
                ComplianceFinding {
                    id: format!("comp-{}-{}", shipment.id, i + 1),
                    rule: rule.rule.to_string(),
                    status,
                    message: message.to_string(),
                    severity: rule.severity,
                }
            })
            .collect();
        Ok(findings)
    }

    async fn score_risk(&self, shipment: &ShipmentRecord) -> StageResult<RiskAssessment> {
        self.simulate_latency().await;

        let seed = Seed::new("risk", &[shipment.id.as_str()]);
        let factors = RiskFactors {
            document_completeness: round_to(seed.range(0, 85.0, 15.0), 1),
            compliance_history: round_to(seed.range(1, 80.0, 20.0), 1),
            value_accuracy: round_to(seed.range(2, 85.0, 15.0), 1),
            origin_verification: round_to(seed.range(3, 80.0, 20.0), 1),
        };
        Ok(RiskAssessment::from_factors(factors))
    }

    async fn optimize_route(
        &self,
        origin: &str,
        destination: &str,
        weight: f64,
    ) -> StageResult<RouteOptimization> {
        self.simulate_latency().await;

        let seed = Seed::new("route", &[origin, destination]);
        debug!(origin = %origin, destination = %destination, weight = weight, "Route searched");
        Ok(RouteOptimization {
            path: vec![
                origin.to_string(),
                "Transit Hub".to_string(),
                destination.to_string(),
            ],
            estimated_cost: seed.pick(0, 5_000, 10_000) as f64,
            estimated_days: seed.pick(1, 10, 20) as u32,
            confidence: round_to(seed.range(2, 88.0, 10.0), 1),
        })
    }
}
