//! # Formula Registry
//!
//! Named calculation strategies behind a common interface. A formula
//! receives the full calculation context plus its configured parameters and
//! is responsible for writing both the claim total and the per-beneficiary
//! breakdown. Formulas are trusted to mutate correctly but not verified
//! here — the processor enforces the cross-field invariants afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::context::CalculationContext;
use super::errors::CalculationError;

/// A named payout calculation strategy
pub trait Formula: Send + Sync {
    /// Derive the payout, writing the claim total and each beneficiary's
    /// amount into the context's claim
    fn apply(
        &self,
        ctx: &mut CalculationContext<'_>,
        params: &serde_json::Value,
    ) -> Result<(), CalculationError>;
}

/// Registry mapping formula names to strategies
#[derive(Default, Clone)]
pub struct FormulaRegistry {
    formulas: HashMap<String, Arc<dyn Formula>>,
}

impl FormulaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            formulas: HashMap::new(),
        }
    }

    /// Register a formula under a name, replacing any previous registration
    pub fn register(&mut self, name: impl Into<String>, formula: Arc<dyn Formula>) {
        let name = name.into();
        info!(formula = %name, "Registered compensation formula");
        self.formulas.insert(name, formula);
    }

    /// Look up a formula by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Formula>> {
        self.formulas.get(name).cloned()
    }

    /// Check whether a formula name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.formulas.contains_key(name)
    }

    /// Names of all registered formulas
    pub fn names(&self) -> Vec<&str> {
        self.formulas.keys().map(String::as_str).collect()
    }
}
