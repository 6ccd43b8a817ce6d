//! # Task Processor
//!
//! Runs one claimed task through claim-then-calculate-then-settle. The
//! state machine per task is `pending --(claimed)--> handling
//! --(success)--> succeed` and `handling --(any error)--> failure`;
//! terminal states are never left.
//!
//! Nothing escapes [`TaskProcessor::process`]: every error raised along the
//! way is converted into a recorded `failure` outcome with a structured
//! diagnostic, so one bad task cannot take down a batch or the loop.

pub mod diagnostics;

pub use diagnostics::{FailureKind, FailureReason};

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::calculation::{CalculationContext, CalculationEngine, CalculationError};
use crate::models::TaskForCompensation;
use crate::repository::{RepositoryError, TaskPatch, TaskRepository};

/// Errors raised while processing a single task. All of them terminate in
/// the task's `failure` state, never in the caller.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Invalid business configuration: {message}")]
    InvalidBizConfig { message: String },

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error("Beneficiary amounts sum to {beneficiary_total}, claim total is {claim_total}")]
    CalculationMismatch {
        beneficiary_total: i64,
        claim_total: i64,
    },

    #[error("Claim total {claim_total} exceeds payout ceiling {maximum}")]
    PayoutCeilingExceeded { claim_total: i64, maximum: i64 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ProcessingError {
    /// Diagnostic classification for this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidBizConfig { .. } => FailureKind::InvalidBizConfig,
            Self::Calculation(CalculationError::InvalidPremiumConfig { .. }) => {
                FailureKind::InvalidPremiumConfig
            }
            Self::Calculation(CalculationError::InvalidFormula { .. }) => {
                FailureKind::InvalidFormula
            }
            Self::Calculation(CalculationError::FormulaFailed { .. }) => FailureKind::FormulaFailed,
            Self::CalculationMismatch { .. } => FailureKind::CalculationMismatch,
            Self::PayoutCeilingExceeded { .. } => FailureKind::PayoutCeilingExceeded,
            Self::Repository(_) => FailureKind::RepositoryError,
        }
    }
}

/// Outcome of processing one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(FailureKind),
}

/// Per-task claim-then-calculate-then-settle orchestration
pub struct TaskProcessor<R> {
    repository: Arc<R>,
    engine: Arc<CalculationEngine>,
}

impl<R: TaskRepository> TaskProcessor<R> {
    /// Create a processor over a repository and calculation engine
    pub fn new(repository: Arc<R>, engine: Arc<CalculationEngine>) -> Self {
        Self { repository, engine }
    }

    /// Process one claimed task. Never returns an error: failures are
    /// absorbed into the task's `failure` state with a diagnostic.
    #[instrument(skip(self, item), fields(task_id = item.task.id, claim_id = item.claim.id))]
    pub async fn process(&self, mut item: TaskForCompensation) -> TaskOutcome {
        match self.compensate(&mut item).await {
            Ok(()) => {
                info!(
                    sum_insured = item.claim.sum_insured,
                    "Compensation task succeeded"
                );
                TaskOutcome::Succeeded
            }
            Err(processing_error) => {
                let kind = processing_error.kind();
                warn!(
                    error = %processing_error,
                    kind = ?kind,
                    "Compensation task failed"
                );
                self.record_failure(item.task.id, &processing_error).await;
                TaskOutcome::Failed(kind)
            }
        }
    }

    /// Execute the payout for one task. The claim is only persisted at the
    /// very end, so any failure leaves storage untouched except for the
    /// task record itself.
    async fn compensate(&self, item: &mut TaskForCompensation) -> Result<(), ProcessingError> {
        // Stamp handling start before calculating so stuck tasks are
        // visible to operators
        let handled_at = Utc::now();
        self.repository
            .update_task(item.task.id, TaskPatch::handled(handled_at))
            .await?;
        item.task.handled_at = Some(handled_at);

        let biz_config =
            item.claim
                .parse_biz_config()
                .map_err(|e| ProcessingError::InvalidBizConfig {
                    message: e.to_string(),
                })?;

        {
            let mut ctx = CalculationContext::new(&mut item.claim, &item.policy);
            self.engine.calculate(&mut ctx, &biz_config.premium)?;
        }

        // Strategies are trusted to mutate, not to mutate correctly: the
        // cross-field invariants are re-checked here
        let beneficiary_total = item.claim.beneficiary_total();
        if beneficiary_total != item.claim.sum_insured {
            return Err(ProcessingError::CalculationMismatch {
                beneficiary_total,
                claim_total: item.claim.sum_insured,
            });
        }

        let maximum = biz_config.auto_compensate.maximum;
        if item.claim.sum_insured > maximum {
            return Err(ProcessingError::PayoutCeilingExceeded {
                claim_total: item.claim.sum_insured,
                maximum,
            });
        }

        self.repository
            .settle_success(&item.claim, &item.task)
            .await?;
        Ok(())
    }

    /// Record a terminal failure with its diagnostic. A diagnostic write
    /// that itself fails is logged and abandoned; it must not propagate.
    async fn record_failure(&self, task_id: i64, processing_error: &ProcessingError) {
        let reason = FailureReason::from_error(processing_error);
        let patch = TaskPatch::failed(Utc::now(), reason.to_json());
        if let Err(update_error) = self.repository.update_task(task_id, patch).await {
            error!(
                task_id = task_id,
                error = %update_error,
                "Failed to record task failure"
            );
        }
    }
}
