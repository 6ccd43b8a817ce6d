//! # Claim Model
//!
//! The claim aggregate being compensated: the claim-level payout total, the
//! per-beneficiary breakdown, and the business-rule configuration snapshot
//! the claim was bound with. Monetary amounts are integer minor units.
//!
//! ## Database Schema
//!
//! Maps to the `claims` and `claim_insureds` tables:
//! - `claims.id`: Primary key (BIGINT)
//! - `claims.claim_no`: Operator-facing claim number (VARCHAR)
//! - `claims.policy_id`: References the policy (BIGINT)
//! - `claims.sum_insured`: Claim-level payout total (BIGINT)
//! - `claims.biz_config`: Business-rule configuration snapshot (JSONB)
//! - `claim_insureds.no`: Beneficiary number within the policy (VARCHAR)
//! - `claim_insureds.sum_insured`: Per-beneficiary payout (BIGINT)

use serde::{Deserialize, Serialize};

/// A claim flagged for automatic compensation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub claim_no: String,
    pub policy_id: i64,
    pub status: String,
    pub sum_insured: i64,
    /// Raw business-rule configuration as bound; parsed on demand so a
    /// malformed snapshot fails the one task that carries it
    pub biz_config: serde_json::Value,
    pub insureds: Vec<ClaimInsured>,
}

impl Claim {
    /// Parse the business-rule configuration snapshot
    pub fn parse_biz_config(&self) -> Result<ClaimBizConfig, serde_json::Error> {
        serde_json::from_value(self.biz_config.clone())
    }

    /// Sum of all per-beneficiary payout amounts
    pub fn beneficiary_total(&self) -> i64 {
        self.insureds.iter().map(|insured| insured.sum_insured).sum()
    }
}

/// A beneficiary's share of the claim payout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimInsured {
    /// Beneficiary number within the policy
    pub no: String,
    /// Per-beneficiary payout amount, written by the calculation
    pub sum_insured: i64,
}

/// Parsed business-rule configuration for a claim. Wire field names are
/// camelCase, matching the bound configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBizConfig {
    pub premium: PremiumConfig,
    pub auto_compensate: AutoCompensateRule,
}

/// How the payout amount is derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumConfig {
    pub calculate_mode: CalculateMode,
    /// Per-beneficiary amount for `fixed` mode
    #[serde(default)]
    pub fixed: Option<i64>,
    /// Named strategy and parameters for `formula` mode
    #[serde(default)]
    pub formula: Option<FormulaConfig>,
}

/// Payout calculation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculateMode {
    /// Every beneficiary receives a fixed configured amount
    Fixed,
    /// A named registry strategy derives the amounts
    Formula,
}

/// Named formula reference with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaConfig {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Hard guard rails for automatic compensation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCompensateRule {
    /// Hard payout ceiling; claim totals above this are never auto-paid
    pub maximum: i64,
}
