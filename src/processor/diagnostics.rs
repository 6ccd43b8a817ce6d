//! # Failure Diagnostics
//!
//! Structured record persisted into a failed task's `failure_reasons`
//! column. Serialization is deterministic: fixed field order plus a sorted
//! extension map, so operator tooling and tests can compare stored
//! diagnostics byte-for-byte.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use super::ProcessingError;

/// Classification of a task failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidBizConfig,
    InvalidPremiumConfig,
    InvalidFormula,
    FormulaFailed,
    CalculationMismatch,
    PayoutCeilingExceeded,
    RepositoryError,
}

/// Structured diagnostic stored on a failed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// Open extension map for error-specific metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl FailureReason {
    /// Build the diagnostic for a processing error, pulling the
    /// error-specific metadata into the extension map
    pub fn from_error(error: &ProcessingError) -> Self {
        let mut details = BTreeMap::new();
        match error {
            ProcessingError::CalculationMismatch {
                beneficiary_total,
                claim_total,
            } => {
                details.insert("beneficiary_total".to_string(), json!(beneficiary_total));
                details.insert("claim_total".to_string(), json!(claim_total));
            }
            ProcessingError::PayoutCeilingExceeded {
                claim_total,
                maximum,
            } => {
                details.insert("claim_total".to_string(), json!(claim_total));
                details.insert("maximum".to_string(), json!(maximum));
            }
            ProcessingError::Calculation(
                crate::calculation::CalculationError::InvalidFormula { name },
            )
            | ProcessingError::Calculation(
                crate::calculation::CalculationError::FormulaFailed { name, .. },
            ) => {
                details.insert("formula".to_string(), json!(name));
            }
            _ => {}
        }

        Self {
            kind: error.kind(),
            message: error.to_string(),
            trace: Some(format!("{error:?}")),
            details,
        }
    }

    /// Serialize for storage in the task's `failure_reasons` column
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            json!({
                "kind": self.kind,
                "message": self.message,
            })
        })
    }
}
