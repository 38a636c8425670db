//! Disposition resolution: the final status derived from accumulated stage
//! outputs.

use serde::{Deserialize, Serialize};

use crate::domain::{FindingStatus, ShipmentRecord, ShipmentStatus};

/// Why a shipment received its disposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DispositionReason {
    /// At least one compliance rule failed.
    ComplianceFailed { rules: Vec<String> },

    /// The risk tier was high or critical.
    HighRisk { level: String },

    /// At least one document failed validation.
    InvalidDocuments { count: usize },

    /// Nothing held the shipment back.
    Clear,
}

impl std::fmt::Display for DispositionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispositionReason::ComplianceFailed { rules } => {
                write!(f, "compliance failed: {}", rules.join(", "))
            }
            DispositionReason::HighRisk { level } => write!(f, "risk level {level}"),
            DispositionReason::InvalidDocuments { count } => {
                write!(f, "{count} document(s) failed validation")
            }
            DispositionReason::Clear => f.write_str("all checks passed"),
        }
    }
}

/// Status together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    pub status: ShipmentStatus,
    pub reason: DispositionReason,
}

/// Resolve the final status of a shipment.
///
/// Rules, first match wins:
/// - any compliance finding `failed` => `rejected`
/// - risk tier `high` or `critical` => `pending_review`
/// - any document `invalid` => `pending_review`
/// - otherwise `cleared`
///
/// Absent slots count as passing.
pub fn resolve_disposition(shipment: &ShipmentRecord) -> ShipmentStatus {
    explain_disposition(shipment).status
}

/// Like [`resolve_disposition`], also reporting which rule decided.
pub fn explain_disposition(shipment: &ShipmentRecord) -> Disposition {
    let failed: Vec<String> = shipment
        .compliance
        .iter()
        .flatten()
        .filter(|f| f.status == FindingStatus::Failed)
        .map(|f| f.rule.clone())
        .collect();
    if !failed.is_empty() {
        return Disposition {
            status: ShipmentStatus::Rejected,
            reason: DispositionReason::ComplianceFailed { rules: failed },
        };
    }

    if let Some(risk) = shipment.risk.as_ref().filter(|r| r.level.requires_review()) {
        return Disposition {
            status: ShipmentStatus::PendingReview,
            reason: DispositionReason::HighRisk {
                level: risk.level.as_str().to_string(),
            },
        };
    }

    let invalid = shipment.documents.iter().filter(|d| d.is_invalid()).count();
    if invalid > 0 {
        return Disposition {
            status: ShipmentStatus::PendingReview,
            reason: DispositionReason::InvalidDocuments { count: invalid },
        };
    }

    Disposition {
        status: ShipmentStatus::Cleared,
        reason: DispositionReason::Clear,
    }
}
