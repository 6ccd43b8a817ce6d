//! # Calculation Engine
//!
//! Dispatches a claim's configured calculation mode. The engine owns the
//! formula registry and is built once before the worker loop starts; it is
//! shared read-only across concurrently processed tasks.

use tracing::debug;

use super::context::CalculationContext;
use super::errors::CalculationError;
use super::formula::{Formula, FormulaRegistry};
use crate::models::{CalculateMode, PremiumConfig};
use std::sync::Arc;

/// Payout calculation dispatcher
#[derive(Default, Clone)]
pub struct CalculationEngine {
    registry: FormulaRegistry,
}

impl CalculationEngine {
    /// Create an engine with an empty formula registry
    pub fn new() -> Self {
        Self {
            registry: FormulaRegistry::new(),
        }
    }

    /// Create an engine over a pre-built registry
    pub fn with_registry(registry: FormulaRegistry) -> Self {
        Self { registry }
    }

    /// Register a formula under a name
    pub fn register_formula(&mut self, name: impl Into<String>, formula: Arc<dyn Formula>) {
        self.registry.register(name, formula);
    }

    /// The formula registry backing `formula` mode
    pub fn registry(&self) -> &FormulaRegistry {
        &self.registry
    }

    /// Run the configured calculation mode against the context, writing the
    /// claim total and per-beneficiary amounts in place
    pub fn calculate(
        &self,
        ctx: &mut CalculationContext<'_>,
        premium: &PremiumConfig,
    ) -> Result<(), CalculationError> {
        match premium.calculate_mode {
            CalculateMode::Fixed => self.calculate_fixed(ctx, premium),
            CalculateMode::Formula => self.calculate_formula(ctx, premium),
        }
    }

    /// `fixed` mode: every beneficiary receives the configured constant and
    /// the claim total is the sum
    fn calculate_fixed(
        &self,
        ctx: &mut CalculationContext<'_>,
        premium: &PremiumConfig,
    ) -> Result<(), CalculationError> {
        let fixed = premium.fixed.ok_or_else(|| {
            CalculationError::invalid_premium_config("fixed mode requires premium.fixed")
        })?;

        let mut total = 0i64;
        for insured in ctx.claim.insureds.iter_mut() {
            insured.sum_insured = fixed;
            total += fixed;
        }
        ctx.claim.sum_insured = total;

        debug!(
            claim_id = ctx.claim.id,
            fixed = fixed,
            beneficiaries = ctx.claim.insureds.len(),
            total = total,
            "Applied fixed compensation"
        );
        Ok(())
    }

    /// `formula` mode: resolve the named strategy and let it write both the
    /// total and the breakdown
    fn calculate_formula(
        &self,
        ctx: &mut CalculationContext<'_>,
        premium: &PremiumConfig,
    ) -> Result<(), CalculationError> {
        let formula_config = premium.formula.as_ref().ok_or_else(|| {
            CalculationError::invalid_premium_config("formula mode requires premium.formula")
        })?;

        let formula = self
            .registry
            .get(&formula_config.name)
            .ok_or_else(|| CalculationError::invalid_formula(&formula_config.name))?;

        debug!(
            claim_id = ctx.claim.id,
            formula = %formula_config.name,
            "Applying compensation formula"
        );
        formula.apply(ctx, &formula_config.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claim, ClaimInsured, FormulaConfig, Policy};
    use chrono::Utc;
    use serde_json::json;

    fn claim_with_beneficiaries(count: usize) -> Claim {
        Claim {
            id: 1,
            claim_no: "CLAIMS20250801000001".to_string(),
            policy_id: 10,
            status: "paid".to_string(),
            sum_insured: 0,
            biz_config: serde_json::Value::Null,
            insureds: (0..count)
                .map(|i| ClaimInsured {
                    no: format!("insured-{i}"),
                    sum_insured: 0,
                })
                .collect(),
        }
    }

    fn policy() -> Policy {
        Policy {
            id: 10,
            policy_no: "FOOINS2025080100000001".to_string(),
            effective_time: Utc::now(),
            expiry_time: Utc::now(),
            premium: 500,
            status: "valid".to_string(),
        }
    }

    fn fixed_premium(fixed: Option<i64>) -> PremiumConfig {
        PremiumConfig {
            calculate_mode: CalculateMode::Fixed,
            fixed,
            formula: None,
        }
    }

    #[test]
    fn test_fixed_mode_assigns_constant_to_every_beneficiary() {
        let engine = CalculationEngine::new();
        let mut claim = claim_with_beneficiaries(3);
        let policy = policy();

        let mut ctx = CalculationContext::new(&mut claim, &policy);
        engine.calculate(&mut ctx, &fixed_premium(Some(100))).unwrap();

        assert_eq!(claim.sum_insured, 300);
        assert!(claim.insureds.iter().all(|i| i.sum_insured == 100));
    }

    #[test]
    fn test_fixed_mode_requires_fixed_amount() {
        let engine = CalculationEngine::new();
        let mut claim = claim_with_beneficiaries(1);
        let policy = policy();

        let mut ctx = CalculationContext::new(&mut claim, &policy);
        let err = engine.calculate(&mut ctx, &fixed_premium(None)).unwrap_err();
        assert!(matches!(err, CalculationError::InvalidPremiumConfig { .. }));
    }

    #[test]
    fn test_formula_mode_rejects_unknown_name() {
        let engine = CalculationEngine::new();
        let mut claim = claim_with_beneficiaries(1);
        let policy = policy();

        let premium = PremiumConfig {
            calculate_mode: CalculateMode::Formula,
            fixed: None,
            formula: Some(FormulaConfig {
                name: "missing".to_string(),
                params: serde_json::Value::Null,
            }),
        };

        let mut ctx = CalculationContext::new(&mut claim, &policy);
        let err = engine.calculate(&mut ctx, &premium).unwrap_err();
        assert_eq!(err, CalculationError::invalid_formula("missing"));
    }

    #[test]
    fn test_formula_mode_runs_registered_strategy() {
        struct PremiumRatio;

        impl Formula for PremiumRatio {
            fn apply(
                &self,
                ctx: &mut CalculationContext<'_>,
                params: &serde_json::Value,
            ) -> Result<(), CalculationError> {
                let ratio = params["ratio"].as_i64().ok_or_else(|| {
                    CalculationError::formula_failed("premium-ratio", "missing ratio param")
                })?;
                let share = ctx.policy.premium * ratio;
                let mut total = 0i64;
                for insured in ctx.claim.insureds.iter_mut() {
                    insured.sum_insured = share;
                    total += share;
                }
                ctx.claim.sum_insured = total;
                Ok(())
            }
        }

        let mut engine = CalculationEngine::new();
        engine.register_formula("premium-ratio", Arc::new(PremiumRatio));

        let mut claim = claim_with_beneficiaries(2);
        let policy = policy();

        let premium = PremiumConfig {
            calculate_mode: CalculateMode::Formula,
            fixed: None,
            formula: Some(FormulaConfig {
                name: "premium-ratio".to_string(),
                params: json!({ "ratio": 2 }),
            }),
        };

        let mut ctx = CalculationContext::new(&mut claim, &policy);
        engine.calculate(&mut ctx, &premium).unwrap();

        assert_eq!(claim.sum_insured, 2000);
        assert!(claim.insureds.iter().all(|i| i.sum_insured == 1000));
    }
}
