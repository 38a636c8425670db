//! The shipment record and the partial patches merged into it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::assessment::{
    ComplianceFinding, DutyBreakdown, HsClassification, RiskAssessment, RouteOptimization,
};
use crate::domain::document::Document;

/// Lifecycle status of a shipment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Draft,
    Processing,
    Validated,
    Cleared,
    Rejected,
    PendingReview,
}

impl ShipmentStatus {
    /// Terminal statuses accept no further stage writes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Cleared | ShipmentStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Draft => "draft",
            ShipmentStatus::Processing => "processing",
            ShipmentStatus::Validated => "validated",
            ShipmentStatus::Cleared => "cleared",
            ShipmentStatus::Rejected => "rejected",
            ShipmentStatus::PendingReview => "pending_review",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exporter or importer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    pub address: String,

    /// Country name or code, passed verbatim to duty and routing.
    pub country: String,
}

impl Party {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            country: country.into(),
        }
    }
}

/// Description of the goods being shipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goods {
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub value: f64,
    pub currency: String,
    pub weight: f64,
    pub weight_unit: String,
}

/// Aggregated intake figures for a run. Intake never touches documents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntakeReport {
    pub documents_processed: usize,
    pub fields_extracted: usize,
}

/// A trade shipment and the outputs of every stage that has run on it.
///
/// Each stage slot is either `None` (stage not run) or fully populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipmentRecord {
    pub id: String,
    pub reference_number: String,

    #[serde(default)]
    pub status: ShipmentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub exporter: Party,
    pub importer: Party,
    pub goods: Goods,

    #[serde(default)]
    pub documents: Vec<Document>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_report: Option<IntakeReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hs_code: Option<HsClassification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty: Option<DutyBreakdown>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Vec<ComplianceFinding>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteOptimization>,
}

impl ShipmentRecord {
    /// A draft shipment with no documents and no stage outputs.
    pub fn new(
        id: impl Into<String>,
        reference_number: impl Into<String>,
        exporter: Party,
        importer: Party,
        goods: Goods,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            reference_number: reference_number.into(),
            status: ShipmentStatus::Draft,
            created_at: now,
            updated_at: now,
            exporter,
            importer,
            goods,
            documents: Vec::new(),
            intake_report: None,
            hs_code: None,
            duty: None,
            compliance: None,
            risk: None,
            route: None,
        }
    }

    /// Attach a document, re-homing it onto this shipment.
    pub fn attach(&mut self, mut document: Document) {
        document.shipment_id = self.id.clone();
        self.documents.push(document);
    }

    /// Merge every set field of `patch` into the record.
    pub fn apply(&mut self, patch: &ShipmentPatch) {
        if let Some(documents) = &patch.documents {
            self.documents = documents.clone();
        }
        if let Some(report) = patch.intake_report {
            self.intake_report = Some(report);
        }
        if let Some(hs_code) = &patch.hs_code {
            self.hs_code = Some(hs_code.clone());
        }
        if let Some(duty) = &patch.duty {
            self.duty = Some(duty.clone());
        }
        if let Some(findings) = &patch.compliance {
            self.compliance = Some(findings.clone());
        }
        if let Some(risk) = &patch.risk {
            self.risk = Some(risk.clone());
        }
        if let Some(route) = &patch.route {
            self.route = Some(route.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Partial update of a shipment, published after each stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShipmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_report: Option<IntakeReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hs_code: Option<HsClassification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty: Option<DutyBreakdown>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Vec<ComplianceFinding>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteOptimization>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ShipmentPatch {
    pub fn intake(report: IntakeReport) -> Self {
        Self {
            intake_report: Some(report),
            ..Self::default()
        }
    }

    pub fn documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Some(documents),
            ..Self::default()
        }
    }

    pub fn hs_code(hs_code: HsClassification) -> Self {
        Self {
            hs_code: Some(hs_code),
            ..Self::default()
        }
    }

    pub fn duty(duty: DutyBreakdown) -> Self {
        Self {
            duty: Some(duty),
            ..Self::default()
        }
    }

    pub fn compliance(findings: Vec<ComplianceFinding>) -> Self {
        Self {
            compliance: Some(findings),
            ..Self::default()
        }
    }

    pub fn risk(risk: RiskAssessment) -> Self {
        Self {
            risk: Some(risk),
            ..Self::default()
        }
    }

    pub fn route(route: RouteOptimization) -> Self {
        Self {
            route: Some(route),
            ..Self::default()
        }
    }

    /// The closing patch carrying the disposition.
    pub fn final_status(status: ShipmentStatus, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            updated_at: Some(at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::{RiskFactors, RiskLevel};
    use crate::fakes::sample_shipment;

    #[test]
    fn test_terminal_statuses() {
        assert!(ShipmentStatus::Cleared.is_terminal());
        assert!(ShipmentStatus::Rejected.is_terminal());
        assert!(!ShipmentStatus::PendingReview.is_terminal());
        assert!(!ShipmentStatus::Processing.is_terminal());
        assert!(!ShipmentStatus::Draft.is_terminal());
    }

    #[test]
    fn test_new_record_has_empty_stage_slots() {
        let record = sample_shipment("ship-1");
        assert_eq!(record.status, ShipmentStatus::Draft);
        assert!(record.hs_code.is_none());
        assert!(record.duty.is_none());
        assert!(record.compliance.is_none());
        assert!(record.risk.is_none());
        assert!(record.route.is_none());
        assert!(record.intake_report.is_none());
    }

    #[test]
    fn test_attach_rehomes_document() {
        let mut record = sample_shipment("ship-9");
        record.attach(Document::from_upload("elsewhere", "invoice.pdf"));
        assert_eq!(record.documents[0].shipment_id, "ship-9");
    }

    #[test]
    fn test_apply_leaves_unset_fields_alone() {
        let mut record = sample_shipment("ship-1");
        record.apply(&ShipmentPatch::risk(RiskAssessment::from_factors(
            RiskFactors::uniform(95.0),
        )));
        record.apply(&ShipmentPatch::final_status(ShipmentStatus::Cleared, Utc::now()));

        assert_eq!(record.risk.as_ref().map(|r| r.level), Some(RiskLevel::Low));
        assert_eq!(record.status, ShipmentStatus::Cleared);
        assert!(record.hs_code.is_none());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ShipmentPatch::final_status(ShipmentStatus::PendingReview, Utc::now());
        let json = serde_json::to_value(&patch).expect("serialize");
        let keys: Vec<&String> = json.as_object().expect("object").keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(json["status"], "pending_review");
        assert!(!patch.is_empty());
        assert!(ShipmentPatch::default().is_empty());
    }
}
