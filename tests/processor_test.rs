//! Processor integration tests over the in-memory repository: the full
//! claim-then-calculate-then-settle flow, every failure class, and the
//! guarantee that a failed calculation never touches the stored claim.

mod common;

use std::sync::Arc;

use compensation_core::calculation::{
    CalculationContext, CalculationEngine, CalculationError, Formula,
};
use compensation_core::models::TaskStatus;
use compensation_core::processor::{FailureKind, FailureReason, TaskOutcome, TaskProcessor};
use serde_json::json;

use common::{fixed_biz_config, formula_biz_config, pending_item, InMemoryTaskRepository};

fn processor(
    repository: &Arc<InMemoryTaskRepository>,
    engine: CalculationEngine,
) -> TaskProcessor<InMemoryTaskRepository> {
    TaskProcessor::new(Arc::clone(repository), Arc::new(engine))
}

fn stored_failure_reason(repository: &InMemoryTaskRepository, task_id: i64) -> FailureReason {
    let task = repository.task(task_id).unwrap();
    let stored = task
        .failure_reasons
        .expect("failed task must carry a diagnostic");
    serde_json::from_value(stored).expect("diagnostic must parse as structured data")
}

#[tokio::test]
async fn fixed_mode_settles_claim_and_marks_succeed() {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let item = pending_item(1, 1, fixed_biz_config(100, 1000));
    repository.insert(item.clone());

    let outcome = processor(&repository, CalculationEngine::new())
        .process(item)
        .await;
    assert_eq!(outcome, TaskOutcome::Succeeded);

    let task = repository.task(1).unwrap();
    assert_eq!(task.status, TaskStatus::Succeed);
    assert!(task.handled_at.is_some());
    assert!(task.finished_at.is_some());
    assert!(task.failure_reasons.is_none());

    let claim = repository.stored_claim(1).unwrap();
    assert_eq!(claim.sum_insured, 100);
    assert_eq!(claim.insureds.len(), 1);
    assert_eq!(claim.insureds[0].sum_insured, 100);
}

#[tokio::test]
async fn payout_above_ceiling_fails_and_leaves_claim_untouched() {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let item = pending_item(2, 1, fixed_biz_config(100, 50));
    repository.insert(item.clone());

    let outcome = processor(&repository, CalculationEngine::new())
        .process(item)
        .await;
    assert_eq!(
        outcome,
        TaskOutcome::Failed(FailureKind::PayoutCeilingExceeded)
    );

    let task = repository.task(2).unwrap();
    assert_eq!(task.status, TaskStatus::Failure);
    assert!(task.finished_at.is_some());

    let reason = stored_failure_reason(&repository, 2);
    assert_eq!(reason.kind, FailureKind::PayoutCeilingExceeded);
    assert_eq!(reason.details["claim_total"], 100);
    assert_eq!(reason.details["maximum"], 50);

    // The calculated amounts must never reach storage on failure
    let claim = repository.stored_claim(2).unwrap();
    assert_eq!(claim.sum_insured, 0);
    assert!(claim.insureds.iter().all(|i| i.sum_insured == 0));
}

#[tokio::test]
async fn mismatching_formula_fails_with_diagnostic_and_preserves_claim() {
    // Writes per-beneficiary amounts that do not add up to the total it
    // reports, exactly what the post-calculation invariant must catch
    struct UnderCountingFormula;

    impl Formula for UnderCountingFormula {
        fn apply(
            &self,
            ctx: &mut CalculationContext<'_>,
            _params: &serde_json::Value,
        ) -> Result<(), CalculationError> {
            for insured in ctx.claim.insureds.iter_mut() {
                insured.sum_insured = 100;
            }
            ctx.claim.sum_insured = 999;
            Ok(())
        }
    }

    let repository = Arc::new(InMemoryTaskRepository::new());
    let item = pending_item(3, 2, formula_biz_config("under-count", json!({}), 10_000));
    repository.insert(item.clone());

    let mut engine = CalculationEngine::new();
    engine.register_formula("under-count", Arc::new(UnderCountingFormula));

    let outcome = processor(&repository, engine).process(item).await;
    assert_eq!(outcome, TaskOutcome::Failed(FailureKind::CalculationMismatch));

    let reason = stored_failure_reason(&repository, 3);
    assert_eq!(reason.kind, FailureKind::CalculationMismatch);
    assert_eq!(reason.details["beneficiary_total"], 200);
    assert_eq!(reason.details["claim_total"], 999);

    let claim = repository.stored_claim(3).unwrap();
    assert_eq!(claim.sum_insured, 0);
    assert!(claim.insureds.iter().all(|i| i.sum_insured == 0));
}

#[tokio::test]
async fn unknown_formula_is_a_task_failure_not_a_crash() {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let item = pending_item(4, 1, formula_biz_config("does-not-exist", json!({}), 1000));
    repository.insert(item.clone());

    let outcome = processor(&repository, CalculationEngine::new())
        .process(item)
        .await;
    assert_eq!(outcome, TaskOutcome::Failed(FailureKind::InvalidFormula));

    let reason = stored_failure_reason(&repository, 4);
    assert_eq!(reason.kind, FailureKind::InvalidFormula);
    assert_eq!(reason.details["formula"], "does-not-exist");
}

#[tokio::test]
async fn registered_formula_settles_through_full_flow() {
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

    let repository = Arc::new(InMemoryTaskRepository::new());
    let item = pending_item(
        5,
        2,
        formula_biz_config("premium-ratio", json!({ "ratio": 2 }), 10_000),
    );
    repository.insert(item.clone());

    let mut engine = CalculationEngine::new();
    engine.register_formula("premium-ratio", Arc::new(PremiumRatio));

    let outcome = processor(&repository, engine).process(item).await;
    assert_eq!(outcome, TaskOutcome::Succeeded);

    // policy premium 500 × ratio 2 × 2 beneficiaries
    let claim = repository.stored_claim(5).unwrap();
    assert_eq!(claim.sum_insured, 2000);
    assert!(claim.insureds.iter().all(|i| i.sum_insured == 1000));
}

#[tokio::test]
async fn malformed_biz_config_fails_the_one_task() {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let item = pending_item(6, 1, json!({ "premium": "not-an-object" }));
    repository.insert(item.clone());

    let outcome = processor(&repository, CalculationEngine::new())
        .process(item)
        .await;
    assert_eq!(outcome, TaskOutcome::Failed(FailureKind::InvalidBizConfig));

    let reason = stored_failure_reason(&repository, 6);
    assert_eq!(reason.kind, FailureKind::InvalidBizConfig);
    assert!(!reason.message.is_empty());
}

#[tokio::test]
async fn repository_failure_surfaces_as_failed_outcome() {
    let repository = Arc::new(InMemoryTaskRepository::new());
    // Nothing inserted: the first repository write fails
    let item = pending_item(7, 1, fixed_biz_config(100, 1000));

    let outcome = processor(&repository, CalculationEngine::new())
        .process(item)
        .await;
    assert_eq!(outcome, TaskOutcome::Failed(FailureKind::RepositoryError));
}
