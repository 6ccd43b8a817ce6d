//! # PostgreSQL Task Repository
//!
//! Production implementation of [`TaskRepository`] over sqlx. Loads the
//! claim aggregate with batched `= ANY($1)` queries, claims tasks with a
//! conditional `RETURNING` update so only rows actually transitioned are
//! reported, and settles success inside one transaction.
//!
//! Rows with undecodable status values are logged and dropped rather than
//! failing the batch: such a task cannot be pending, so the caller treats
//! it like any other non-ready task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use super::errors::RepositoryError;
use super::{TaskPatch, TaskRepository};
use crate::models::{
    Claim, ClaimInsured, CompensationTask, Policy, TaskForCompensation, TaskStatus,
};

/// sqlx-backed repository over the business database
#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    /// Create a repository over an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    claim_id: i64,
    status: String,
    auto_compensate: String,
    handled_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    failure_reasons: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ClaimRow {
    id: i64,
    claim_no: String,
    policy_id: i64,
    status: String,
    sum_insured: i64,
    biz_config: serde_json::Value,
}

#[derive(Debug, FromRow)]
struct ClaimInsuredRow {
    claim_id: i64,
    no: String,
    sum_insured: Option<i64>,
}

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: i64,
    policy_no: String,
    effective_time: DateTime<Utc>,
    expiry_time: DateTime<Utc>,
    premium: i64,
    status: String,
}

impl TaskRow {
    /// Convert a raw row into the domain task, rejecting rows whose status
    /// strings do not belong to the state machine
    fn into_task(self) -> Result<CompensationTask, String> {
        let status: TaskStatus = self.status.parse()?;
        let auto_compensate = self.auto_compensate.parse()?;
        Ok(CompensationTask {
            id: self.id,
            claim_id: self.claim_id,
            status,
            auto_compensate,
            handled_at: self.handled_at,
            finished_at: self.finished_at,
            failure_reasons: self.failure_reasons,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn query_tasks(
        &self,
        task_ids: &[String],
    ) -> Result<Vec<TaskForCompensation>, RepositoryError> {
        // Identifiers that are not numeric cannot match a row; they fall out
        // here and surface as "task not found" during reconciliation
        let ids: Vec<i64> = task_ids.iter().filter_map(|id| id.parse().ok()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let task_rows: Vec<TaskRow> = sqlx::query_as(
            r"
            SELECT id, claim_id, status, auto_compensate, handled_at, finished_at,
                   failure_reasons, created_at, updated_at
            FROM compensation_tasks
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database_query("query_tasks", e.to_string()))?;

        if task_rows.is_empty() {
            return Ok(Vec::new());
        }

        let claim_ids: Vec<i64> = task_rows.iter().map(|row| row.claim_id).collect();
        let claim_rows: Vec<ClaimRow> = sqlx::query_as(
            r"
            SELECT id, claim_no, policy_id, status, sum_insured, biz_config
            FROM claims
            WHERE id = ANY($1)
            ",
        )
        .bind(&claim_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database_query("query_claims", e.to_string()))?;

        let insured_rows: Vec<ClaimInsuredRow> = sqlx::query_as(
            r"
            SELECT claim_id, no, sum_insured
            FROM claim_insureds
            WHERE claim_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&claim_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database_query("query_claim_insureds", e.to_string()))?;

        let policy_ids: Vec<i64> = claim_rows.iter().map(|row| row.policy_id).collect();
        let policy_rows: Vec<PolicyRow> = sqlx::query_as(
            r"
            SELECT id, policy_no, effective_time, expiry_time, premium, status
            FROM policies
            WHERE id = ANY($1)
            ",
        )
        .bind(&policy_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database_query("query_policies", e.to_string()))?;

        let mut insureds_by_claim: HashMap<i64, Vec<ClaimInsured>> = HashMap::new();
        for row in insured_rows {
            insureds_by_claim
                .entry(row.claim_id)
                .or_default()
                .push(ClaimInsured {
                    no: row.no,
                    sum_insured: row.sum_insured.unwrap_or(0),
                });
        }

        let policies: HashMap<i64, Policy> = policy_rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    Policy {
                        id: row.id,
                        policy_no: row.policy_no,
                        effective_time: row.effective_time,
                        expiry_time: row.expiry_time,
                        premium: row.premium,
                        status: row.status,
                    },
                )
            })
            .collect();

        let mut claims: HashMap<i64, Claim> = HashMap::new();
        for row in claim_rows {
            let insureds = insureds_by_claim.remove(&row.id).unwrap_or_default();
            claims.insert(
                row.id,
                Claim {
                    id: row.id,
                    claim_no: row.claim_no,
                    policy_id: row.policy_id,
                    status: row.status,
                    sum_insured: row.sum_insured,
                    biz_config: row.biz_config,
                    insureds,
                },
            );
        }

        let mut loaded = Vec::with_capacity(task_rows.len());
        for row in task_rows {
            let task_id = row.id;
            let claim_id = row.claim_id;
            let task = match row.into_task() {
                Ok(task) => task,
                Err(reason) => {
                    warn!(task_id = task_id, reason = %reason, "Dropping task with undecodable row");
                    continue;
                }
            };
            let Some(claim) = claims.get(&claim_id).cloned() else {
                warn!(task_id = task_id, claim_id = claim_id, "Task references a missing claim, dropping");
                continue;
            };
            let Some(policy) = policies.get(&claim.policy_id).cloned() else {
                warn!(
                    task_id = task_id,
                    policy_id = claim.policy_id,
                    "Claim references a missing policy, dropping"
                );
                continue;
            };
            loaded.push(TaskForCompensation {
                task,
                claim,
                policy,
            });
        }

        debug!(
            requested = task_ids.len(),
            loaded = loaded.len(),
            "Loaded compensation tasks"
        );
        Ok(loaded)
    }

    #[instrument(skip(self))]
    async fn claim_tasks(&self, task_ids: &[i64]) -> Result<Vec<i64>, RepositoryError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let claimed: Vec<(i64,)> = sqlx::query_as(
            r"
            UPDATE compensation_tasks
            SET status = 'handling', updated_at = NOW()
            WHERE id = ANY($1) AND status = 'pending'
            RETURNING id
            ",
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::database_query("claim_tasks", e.to_string()))?;

        let claimed: Vec<i64> = claimed.into_iter().map(|row| row.0).collect();
        debug!(
            requested = task_ids.len(),
            claimed = claimed.len(),
            "Claimed pending tasks"
        );
        Ok(claimed)
    }

    async fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE compensation_tasks
            SET status          = COALESCE($2, status),
                handled_at      = COALESCE($3, handled_at),
                finished_at     = COALESCE($4, finished_at),
                failure_reasons = COALESCE($5, failure_reasons),
                updated_at      = NOW()
            WHERE id = $1
            ",
        )
        .bind(task_id)
        .bind(patch.status.map(|status| status.to_string()))
        .bind(patch.handled_at)
        .bind(patch.finished_at)
        .bind(patch.failure_reasons)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::database_query("update_task", e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self, claim, task), fields(task_id = task.id, claim_id = claim.id))]
    async fn settle_success(
        &self,
        claim: &Claim,
        task: &CompensationTask,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::database_connection(e.to_string()))?;

        sqlx::query("UPDATE claims SET sum_insured = $2, updated_at = NOW() WHERE id = $1")
            .bind(claim.id)
            .bind(claim.sum_insured)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::database_query("settle_claim", e.to_string()))?;

        for insured in &claim.insureds {
            sqlx::query(
                r"
                UPDATE claim_insureds
                SET sum_insured = $3, updated_at = NOW()
                WHERE claim_id = $1 AND no = $2
                ",
            )
            .bind(claim.id)
            .bind(&insured.no)
            .bind(insured.sum_insured)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::database_query("settle_claim_insureds", e.to_string()))?;
        }

        sqlx::query(
            r"
            UPDATE compensation_tasks
            SET status = 'succeed', finished_at = NOW(), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(task.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::database_query("settle_task", e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::database_query("settle_commit", e.to_string()))?;

        info!(
            task_id = task.id,
            claim_id = claim.id,
            sum_insured = claim.sum_insured,
            "Compensation settled"
        );
        Ok(())
    }
}
