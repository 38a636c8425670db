//! Reference tables used by the baseline agents.

use tradeflow_core::{FindingSeverity, FindingStatus};

/// One harmonized-system heading the classifier can choose.
#[derive(Debug, Clone, Copy)]
pub struct HsHeading {
    pub code: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

pub const HS_HEADINGS: [HsHeading; 5] = [
    HsHeading {
        code: "8542.31",
        description: "Electronic integrated circuits: Processors and controllers",
        category: "Electronics",
    },
    HsHeading {
        code: "9018.19",
        description: "Medical instruments and appliances",
        category: "Medical",
    },
    HsHeading {
        code: "8471.30",
        description: "Portable automatic data processing machines",
        category: "Electronics",
    },
    HsHeading {
        code: "8517.62",
        description: "Machines for reception, conversion and transmission",
        category: "Telecommunications",
    },
    HsHeading {
        code: "9027.50",
        description: "Instruments using optical radiations",
        category: "Scientific",
    },
];

/// A compliance rule and how it behaves when drawn against.
///
/// A draw at or above `pass_threshold` passes; anything below yields
/// `fallback`.
#[derive(Debug, Clone, Copy)]
pub struct ComplianceRule {
    pub rule: &'static str,
    pub severity: FindingSeverity,
    pub pass_threshold: f64,
    pub passed_message: &'static str,
    pub fallback: FindingStatus,
    pub fallback_message: &'static str,
}

pub const COMPLIANCE_RULES: [ComplianceRule; 4] = [
    ComplianceRule {
        rule: "Export License Verification",
        severity: FindingSeverity::High,
        pass_threshold: 0.2,
        passed_message: "Valid export license found",
        fallback: FindingStatus::Warning,
        fallback_message: "Export license expires in 30 days",
    },
    ComplianceRule {
        rule: "Dual-Use Goods Check",
        severity: FindingSeverity::Medium,
        pass_threshold: 0.1,
        passed_message: "No dual-use restrictions apply",
        fallback: FindingStatus::Failed,
        fallback_message: "Requires additional authorization",
    },
    ComplianceRule {
        rule: "Sanctions Screening",
        severity: FindingSeverity::High,
        pass_threshold: 0.0,
        passed_message: "No sanctions matches found",
        fallback: FindingStatus::Failed,
        fallback_message: "Sanctions match requires review",
    },
    ComplianceRule {
        rule: "Documentation Completeness",
        severity: FindingSeverity::Low,
        pass_threshold: 0.15,
        passed_message: "All required documents present",
        fallback: FindingStatus::Warning,
        fallback_message: "Certificate of Origin recommended",
    },
];

impl ComplianceRule {
    /// Status and message for a draw in `[0, 1)`.
    pub fn evaluate(&self, draw: f64) -> (FindingStatus, &'static str) {
        if draw >= self.pass_threshold {
            (FindingStatus::Passed, self.passed_message)
        } else {
            (self.fallback, self.fallback_message)
        }
    }
}
