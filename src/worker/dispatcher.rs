//! # Batch Dispatcher
//!
//! Turns one decoded batch of task identifiers into settled outcomes:
//! reconcile against storage in delivery order, filter out everything that
//! is not ready (each reason logged, the task left untouched for a later
//! cycle or manual review), atomically claim the survivors, then process
//! them concurrently and wait for all of them before the next poll.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::calculation::CalculationEngine;
use crate::models::{TaskForCompensation, TaskStatus};
use crate::processor::{TaskOutcome, TaskProcessor};
use crate::repository::{RepositoryError, TaskRepository};

/// Result counts for one dispatched batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Identifiers decoded from the stream, duplicates included
    pub requested: usize,
    /// Identifiers with no matching task row
    pub skipped_missing: usize,
    /// Tasks whose status was not exactly `pending`
    pub skipped_not_pending: usize,
    /// Tasks whose auto-compensate flag was not exactly `enabled`
    pub skipped_disabled: usize,
    /// Tasks another consumer claimed between load and claim
    pub lost_claims: usize,
    /// Tasks settled as `succeed`
    pub succeeded: usize,
    /// Tasks recorded as `failure`
    pub failed: usize,
}

impl DispatchSummary {
    /// Tasks that reached the processor
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Load-filter-claim-process pipeline for one batch
pub struct BatchDispatcher<R> {
    repository: Arc<R>,
    processor: TaskProcessor<R>,
}

impl<R: TaskRepository> BatchDispatcher<R> {
    /// Create a dispatcher over a repository and calculation engine
    pub fn new(repository: Arc<R>, engine: Arc<CalculationEngine>) -> Self {
        let processor = TaskProcessor::new(Arc::clone(&repository), engine);
        Self {
            repository,
            processor,
        }
    }

    /// Dispatch one decoded batch. Repository errors during load or claim
    /// abort the batch (no task state has been touched yet); everything
    /// after the claim is absorbed per task by the processor.
    pub async fn dispatch(&self, task_ids: &[String]) -> Result<DispatchSummary, RepositoryError> {
        let mut summary = DispatchSummary {
            requested: task_ids.len(),
            ..DispatchSummary::default()
        };
        if task_ids.is_empty() {
            return Ok(summary);
        }

        let loaded = self.repository.query_tasks(task_ids).await?;

        // Reconcile in delivery order. A redelivered id can appear twice in
        // one batch and must only be considered once.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ready: Vec<TaskForCompensation> = Vec::new();
        for task_id in task_ids {
            if !seen.insert(task_id.as_str()) {
                continue;
            }

            let Some(item) = loaded
                .iter()
                .find(|item| item.task.id.to_string() == *task_id)
            else {
                warn!(task_id = %task_id, "Task not found, skipping");
                summary.skipped_missing += 1;
                continue;
            };

            if item.task.status != TaskStatus::Pending {
                warn!(
                    task_id = item.task.id,
                    status = %item.task.status,
                    "Task is not pending, skipping"
                );
                summary.skipped_not_pending += 1;
                continue;
            }

            if !item.task.auto_compensate.is_enabled() {
                warn!(
                    task_id = item.task.id,
                    "Automatic compensation disabled for task, skipping"
                );
                summary.skipped_disabled += 1;
                continue;
            }

            ready.push(item.clone());
        }
        if ready.is_empty() {
            return Ok(summary);
        }

        let ready_ids: Vec<i64> = ready.iter().map(|item| item.task.id).collect();
        let claimed: HashSet<i64> = self
            .repository
            .claim_tasks(&ready_ids)
            .await?
            .into_iter()
            .collect();

        let mut batch = Vec::with_capacity(claimed.len());
        for mut item in ready {
            if !claimed.contains(&item.task.id) {
                warn!(
                    task_id = item.task.id,
                    "Task claimed by another consumer, skipping"
                );
                summary.lost_claims += 1;
                continue;
            }
            item.task.status = TaskStatus::Handling;
            batch.push(item);
        }

        let outcomes = join_all(
            batch
                .into_iter()
                .map(|item| self.processor.process(item)),
        )
        .await;

        for outcome in outcomes {
            match outcome {
                TaskOutcome::Succeeded => summary.succeeded += 1,
                TaskOutcome::Failed(_) => summary.failed += 1,
            }
        }

        info!(
            requested = summary.requested,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped_missing + summary.skipped_not_pending + summary.skipped_disabled,
            "Dispatched compensation batch"
        );
        Ok(summary)
    }
}
