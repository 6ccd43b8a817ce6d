//! # Calculation Engine
//!
//! Derives the payout for a claim: a total and a per-beneficiary breakdown.
//! Two modes exist. `fixed` assigns every beneficiary the configured
//! constant. `formula` resolves a named strategy from the registry and
//! trusts it to write both the total and the breakdown — which is why the
//! processor re-checks the cross-field invariants after every calculation.
//!
//! New payout rules are added by registering a [`Formula`] under a name;
//! the processor never changes. An unknown name is a typed configuration
//! error, not a crash.

pub mod context;
pub mod engine;
pub mod errors;
pub mod formula;

pub use context::CalculationContext;
pub use engine::CalculationEngine;
pub use errors::CalculationError;
pub use formula::{Formula, FormulaRegistry};
