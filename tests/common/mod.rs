//! Shared test support: an in-memory task repository and fixture builders.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

use compensation_core::models::{
    AutoCompensate, Claim, ClaimInsured, CompensationTask, Policy, TaskForCompensation, TaskStatus,
};
use compensation_core::repository::{RepositoryError, TaskPatch, TaskRepository};

/// In-memory stand-in for the business database. Mirrors the atomicity the
/// production repository guarantees: `claim_tasks` only moves pending rows
/// and reports the ids it moved, `settle_success` persists the claim and
/// the `succeed` transition together.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    store: Mutex<HashMap<i64, TaskForCompensation>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: TaskForCompensation) {
        self.store.lock().unwrap().insert(item.task.id, item);
    }

    pub fn task(&self, task_id: i64) -> Option<CompensationTask> {
        self.store
            .lock()
            .unwrap()
            .get(&task_id)
            .map(|item| item.task.clone())
    }

    pub fn stored_claim(&self, task_id: i64) -> Option<Claim> {
        self.store
            .lock()
            .unwrap()
            .get(&task_id)
            .map(|item| item.claim.clone())
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn query_tasks(
        &self,
        task_ids: &[String],
    ) -> Result<Vec<TaskForCompensation>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(task_ids
            .iter()
            .filter_map(|id| id.parse::<i64>().ok())
            .filter_map(|id| store.get(&id).cloned())
            .collect())
    }

    async fn claim_tasks(&self, task_ids: &[i64]) -> Result<Vec<i64>, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let mut claimed = Vec::new();
        for task_id in task_ids {
            if let Some(item) = store.get_mut(task_id) {
                if item.task.status == TaskStatus::Pending {
                    item.task.status = TaskStatus::Handling;
                    item.task.updated_at = Utc::now();
                    claimed.push(*task_id);
                }
            }
        }
        Ok(claimed)
    }

    async fn update_task(&self, task_id: i64, patch: TaskPatch) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let item = store.get_mut(&task_id).ok_or_else(|| {
            RepositoryError::data_integrity(
                "compensation_task",
                format!("task {task_id} does not exist"),
            )
        })?;

        if let Some(status) = patch.status {
            item.task.status = status;
        }
        if let Some(handled_at) = patch.handled_at {
            item.task.handled_at = Some(handled_at);
        }
        if let Some(finished_at) = patch.finished_at {
            item.task.finished_at = Some(finished_at);
        }
        if let Some(failure_reasons) = patch.failure_reasons {
            item.task.failure_reasons = Some(failure_reasons);
        }
        item.task.updated_at = Utc::now();
        Ok(())
    }

    async fn settle_success(
        &self,
        claim: &Claim,
        task: &CompensationTask,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().unwrap();
        let item = store.get_mut(&task.id).ok_or_else(|| {
            RepositoryError::data_integrity(
                "compensation_task",
                format!("task {} does not exist", task.id),
            )
        })?;

        item.claim = claim.clone();
        item.task.status = TaskStatus::Succeed;
        item.task.finished_at = Some(Utc::now());
        item.task.updated_at = Utc::now();
        Ok(())
    }
}

/// Business configuration for `fixed` calculation mode
pub fn fixed_biz_config(fixed: i64, maximum: i64) -> serde_json::Value {
    json!({
        "premium": { "calculateMode": "fixed", "fixed": fixed },
        "autoCompensate": { "maximum": maximum }
    })
}

/// Business configuration for `formula` calculation mode
pub fn formula_biz_config(name: &str, params: serde_json::Value, maximum: i64) -> serde_json::Value {
    json!({
        "premium": { "calculateMode": "formula", "formula": { "name": name, "params": params } },
        "autoCompensate": { "maximum": maximum }
    })
}

/// A pending, auto-compensate-enabled task with its claim and policy
pub fn pending_item(
    task_id: i64,
    beneficiaries: usize,
    biz_config: serde_json::Value,
) -> TaskForCompensation {
    let claim_id = task_id + 1000;
    let policy_id = claim_id + 1000;
    let now = Utc::now();

    TaskForCompensation {
        task: CompensationTask {
            id: task_id,
            claim_id,
            status: TaskStatus::Pending,
            auto_compensate: AutoCompensate::Enabled,
            handled_at: None,
            finished_at: None,
            failure_reasons: None,
            created_at: now,
            updated_at: now,
        },
        claim: Claim {
            id: claim_id,
            claim_no: format!("CLAIMS20250801{task_id:06}"),
            policy_id,
            status: "paid".to_string(),
            sum_insured: 0,
            biz_config,
            insureds: (0..beneficiaries)
                .map(|i| ClaimInsured {
                    no: format!("insured-{i}"),
                    sum_insured: 0,
                })
                .collect(),
        },
        policy: Policy {
            id: policy_id,
            policy_no: format!("FOOINS20250801{task_id:08}"),
            effective_time: now,
            expiry_time: now,
            premium: 500,
            status: "valid".to_string(),
        },
    }
}
