//! Outputs of the single-call stages: classification, duty, compliance,
//! risk and routing.

use serde::{Deserialize, Serialize};

use crate::domain::event::Severity;

/// HS-style tariff classification of the goods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HsClassification {
    pub code: String,
    pub description: String,

    /// Classifier confidence, percent.
    pub confidence: f64,

    pub category: String,
}

/// Duty and tax breakdown for a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DutyBreakdown {
    /// Classification code the duty was computed for.
    pub hs_code: String,

    /// Declared goods value the amounts are based on.
    pub base_value: f64,

    /// Duty rate as a fraction (0.05 = 5%).
    pub duty_rate: f64,

    pub duty_amount: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub currency: String,
}

/// Outcome of a single compliance rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Passed,
    Failed,
    Warning,
}

impl FindingStatus {
    /// Severity of the per-finding compliance event.
    pub fn event_severity(&self) -> Severity {
        match self {
            FindingStatus::Passed => Severity::Success,
            FindingStatus::Failed => Severity::Error,
            FindingStatus::Warning => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Passed => "passed",
            FindingStatus::Failed => "failed",
            FindingStatus::Warning => "warning",
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much a compliance rule matters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
}

/// Result of evaluating one compliance rule against a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceFinding {
    pub id: String,
    pub rule: String,
    pub status: FindingStatus,
    pub message: String,
    pub severity: FindingSeverity,
}

/// Tier derived from the overall risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Tier for an overall score where higher means safer.
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 85.0 {
            RiskLevel::Low
        } else if overall >= 70.0 {
            RiskLevel::Medium
        } else if overall >= 50.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Whether this tier by itself holds a shipment for review.
    pub fn requires_review(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }

    /// Standard recommendations for a tier.
    pub fn recommendations(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            RiskLevel::Low => &[
                "Shipment cleared for processing",
                "Standard processing time applies",
            ],
            RiskLevel::Medium => &[
                "Additional document review recommended",
                "Estimated 1-2 day delay",
            ],
            RiskLevel::High => &[
                "Manual inspection required",
                "Compliance officer review needed",
            ],
            RiskLevel::Critical => &[
                "Immediate review required",
                "Potential regulatory violation",
                "Contact compliance team",
            ],
        };
        lines.iter().map(|s| s.to_string()).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four scored risk sub-factors, each 0-100 where higher is safer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskFactors {
    pub document_completeness: f64,
    pub compliance_history: f64,
    pub value_accuracy: f64,
    pub origin_verification: f64,
}

impl RiskFactors {
    /// All four factors set to the same score.
    pub fn uniform(score: f64) -> Self {
        Self {
            document_completeness: score,
            compliance_history: score,
            value_accuracy: score,
            origin_verification: score,
        }
    }

    /// Factors paired with a display label, in reporting order.
    pub fn labelled(&self) -> [(&'static str, f64); 4] {
        [
            ("Document Completeness", self.document_completeness),
            ("Compliance History", self.compliance_history),
            ("Value Accuracy", self.value_accuracy),
            ("Origin Verification", self.origin_verification),
        ]
    }

    /// Weighted overall score: 100 minus the weighted factor shortfalls.
    pub fn overall(&self) -> f64 {
        100.0
            - ((100.0 - self.document_completeness) * 0.25
                + (100.0 - self.compliance_history) * 0.35
                + (100.0 - self.value_accuracy) * 0.20
                + (100.0 - self.origin_verification) * 0.20)
    }
}

/// Impact label of a single risk factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FactorImpact {
    Low,
    Medium,
    High,
}

impl FactorImpact {
    pub fn from_score(score: f64) -> Self {
        if score < 70.0 {
            FactorImpact::High
        } else if score < 85.0 {
            FactorImpact::Medium
        } else {
            FactorImpact::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorImpact::Low => "low",
            FactorImpact::Medium => "medium",
            FactorImpact::High => "high",
        }
    }
}

/// Full risk assessment of a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    /// Overall score, 0-100, rounded to one decimal.
    pub overall: f64,
    pub factors: RiskFactors,
    pub level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    /// Derive overall score, tier and recommendations from the factors.
    pub fn from_factors(factors: RiskFactors) -> Self {
        let raw = factors.overall();
        let level = RiskLevel::from_overall(raw);
        Self {
            overall: (raw * 10.0).round() / 10.0,
            factors,
            level,
            recommendations: level.recommendations(),
        }
    }
}

/// Proposed route for the shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteOptimization {
    /// Origin, zero or more transit points, destination.
    pub path: Vec<String>,
    pub estimated_cost: f64,
    pub estimated_days: u32,

    /// Optimizer confidence, percent.
    pub confidence: f64,
}
