//! Calculation error types

use thiserror::Error;

/// Errors raised while deriving a payout
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("Invalid premium configuration: {reason}")]
    InvalidPremiumConfig { reason: String },

    #[error("Unknown compensation formula: '{name}'")]
    InvalidFormula { name: String },

    #[error("Formula '{name}' failed: {message}")]
    FormulaFailed { name: String, message: String },
}

impl CalculationError {
    /// Create an invalid premium configuration error
    pub fn invalid_premium_config(reason: impl Into<String>) -> Self {
        Self::InvalidPremiumConfig {
            reason: reason.into(),
        }
    }

    /// Create an unknown formula error
    pub fn invalid_formula(name: impl Into<String>) -> Self {
        Self::InvalidFormula { name: name.into() }
    }

    /// Create a formula execution error
    pub fn formula_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FormulaFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}
