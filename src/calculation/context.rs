//! Calculation context
//!
//! Ephemeral view handed to a calculation: the claim being compensated
//! (mutable — the calculation writes amounts into it) and its policy
//! (read-only). Exists only for the duration of one calculation call.

use crate::models::{Claim, Policy};

/// Ephemeral view of one claim-with-policy for a single calculation call
pub struct CalculationContext<'a> {
    pub claim: &'a mut Claim,
    pub policy: &'a Policy,
}

impl<'a> CalculationContext<'a> {
    pub fn new(claim: &'a mut Claim, policy: &'a Policy) -> Self {
        Self { claim, policy }
    }
}
