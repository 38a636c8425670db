//! Shipment documents and the per-document stage outputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared type of an attached document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    CommercialInvoice,
    PackingList,
    BillOfLading,
    CertificateOfOrigin,
    Other,
}

impl DocumentType {
    /// Infer a document type from an uploaded file name.
    ///
    /// Matching is case-insensitive and checked in a fixed order, so
    /// `"invoice_packing.pdf"` is a commercial invoice.
    pub fn infer_from_filename(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.contains("invoice") {
            DocumentType::CommercialInvoice
        } else if lower.contains("packing") {
            DocumentType::PackingList
        } else if lower.contains("bill") || lower.contains("lading") {
            DocumentType::BillOfLading
        } else if lower.contains("certificate") || lower.contains("origin") {
            DocumentType::CertificateOfOrigin
        } else {
            DocumentType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::CommercialInvoice => "commercial_invoice",
            DocumentType::PackingList => "packing_list",
            DocumentType::BillOfLading => "bill_of_lading",
            DocumentType::CertificateOfOrigin => "certificate_of_origin",
            DocumentType::Other => "other",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation state of a document.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Valid,
    Invalid,
}

/// A document attached to a shipment.
///
/// Created at intake and written only by the validation stage, exactly once
/// per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,

    /// Owning shipment.
    pub shipment_id: String,

    #[serde(rename = "type")]
    pub doc_type: DocumentType,

    pub file_name: String,

    pub uploaded_at: DateTime<Utc>,

    #[serde(default)]
    pub validation_status: ValidationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<String>>,
}

impl Document {
    /// Create a pending document with an explicit type.
    pub fn new(
        shipment_id: impl Into<String>,
        doc_type: DocumentType,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("doc-{}", Uuid::new_v4()),
            shipment_id: shipment_id.into(),
            doc_type,
            file_name: file_name.into(),
            uploaded_at: Utc::now(),
            validation_status: ValidationStatus::Pending,
            validation_errors: None,
        }
    }

    /// Create a pending document whose type is inferred from the file name.
    pub fn from_upload(shipment_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let doc_type = DocumentType::infer_from_filename(&file_name);
        Self::new(shipment_id, doc_type, file_name)
    }

    /// Record the validation stage's verdict on this document.
    pub fn apply_validation(&mut self, outcome: &ValidationOutcome) {
        self.validation_status = if outcome.valid {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid
        };
        self.validation_errors = Some(outcome.errors.clone());
    }

    pub fn is_invalid(&self) -> bool {
        self.validation_status == ValidationStatus::Invalid
    }
}

/// Output of the intake stage for one document.
///
/// Logged only; never written back onto the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentExtraction {
    pub fields: BTreeMap<String, serde_json::Value>,

    /// Extraction confidence, percent.
    pub confidence: f64,
}

impl DocumentExtraction {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Output of the validation stage for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}
