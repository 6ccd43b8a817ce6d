//! # Policy Model
//!
//! Read-only policy context handed to calculation strategies. The worker
//! never mutates a policy; formulas read coverage dates and the bound
//! premium to derive payout amounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The policy a claim was raised against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: i64,
    pub policy_no: String,
    pub effective_time: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
    /// Bound premium in integer minor units
    pub premium: i64,
    pub status: String,
}
