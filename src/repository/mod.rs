//! # Task Repository
//!
//! Boundary to durable business storage. The worker core only depends on
//! the [`TaskRepository`] trait; the PostgreSQL implementation lives behind
//! it so tests can substitute an in-memory store. The contract carries the
//! two atomicity guarantees the design leans on: `claim_tasks` moves
//! `pending → handling` atomically and reports which ids actually moved,
//! and `settle_success` persists the calculated claim and the `succeed`
//! transition in one transaction.

pub mod errors;
pub mod postgres;

pub use errors::RepositoryError;
pub use postgres::PgTaskRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Claim, CompensationTask, TaskForCompensation, TaskStatus};

/// Partial update applied to one task row
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub handled_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failure_reasons: Option<serde_json::Value>,
}

impl TaskPatch {
    /// Patch stamping the moment processing started
    pub fn handled(at: DateTime<Utc>) -> Self {
        Self {
            handled_at: Some(at),
            ..Self::default()
        }
    }

    /// Patch recording a terminal failure with its diagnostic
    pub fn failed(at: DateTime<Utc>, reasons: serde_json::Value) -> Self {
        Self {
            status: Some(TaskStatus::Failure),
            finished_at: Some(at),
            failure_reasons: Some(reasons),
            ..Self::default()
        }
    }
}

/// Contract the worker requires from business storage
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Load existing tasks with their claim aggregates. Identifiers with no
    /// matching task are simply absent from the result; the caller
    /// reconciles against the requested ids.
    async fn query_tasks(
        &self,
        task_ids: &[String],
    ) -> Result<Vec<TaskForCompensation>, RepositoryError>;

    /// Atomically transition `pending → handling` for the given tasks,
    /// skipping any task no longer pending. Returns the ids actually
    /// claimed, so a lost race surfaces as an absent id rather than an
    /// error.
    async fn claim_tasks(&self, task_ids: &[i64]) -> Result<Vec<i64>, RepositoryError>;

    /// Apply a partial update to one task
    async fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<(), RepositoryError>;

    /// Atomically persist the calculated claim (total and per-beneficiary
    /// amounts) and mark the task `succeed` with its finish timestamp
    async fn settle_success(
        &self,
        claim: &Claim,
        task: &CompensationTask,
    ) -> Result<(), RepositoryError>;
}
