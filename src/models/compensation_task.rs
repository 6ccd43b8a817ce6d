//! # Compensation Task Model
//!
//! A compensation task is the unit of work meaning "pay this claim
//! automatically". Tasks are created outside this system when a claim is
//! paid and flagged for automatic compensation; this worker only ever
//! transitions their status and stamps timestamps and diagnostics.
//!
//! ## Database Schema
//!
//! Maps to the `compensation_tasks` table:
//! - `id`: Primary key (BIGINT)
//! - `claim_id`: References the claim being compensated (BIGINT)
//! - `status`: `pending` → `handling` → `succeed` | `failure` (VARCHAR)
//! - `auto_compensate`: `enabled` | `disabled` (VARCHAR)
//! - `handled_at` / `finished_at`: processing timestamps (TIMESTAMPTZ)
//! - `failure_reasons`: structured diagnostic, failure only (JSONB)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::claim::Claim;
use super::policy::Policy;

/// Task state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Initial state when the task is created
    Pending,
    /// Task has been claimed by a worker and is being processed
    Handling,
    /// Compensation settled successfully
    Succeed,
    /// Compensation failed; `failure_reasons` carries the diagnostic
    Failure,
}

impl TaskStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeed | Self::Failure)
    }

    /// Check if this is an active state (task is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Handling)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Handling => write!(f, "handling"),
            Self::Succeed => write!(f, "succeed"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "handling" => Ok(Self::Handling),
            "succeed" => Ok(Self::Succeed),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Whether a task may be compensated without manual review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoCompensate {
    Enabled,
    Disabled,
}

impl AutoCompensate {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl fmt::Display for AutoCompensate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::str::FromStr for AutoCompensate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            _ => Err(format!("Invalid auto-compensate flag: {s}")),
        }
    }
}

/// Represents one auto-compensation work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationTask {
    pub id: i64,
    pub claim_id: i64,
    pub status: TaskStatus,
    pub auto_compensate: AutoCompensate,
    pub handled_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failure_reasons: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task together with the claim aggregate it compensates — the unit the
/// repository loads and the processor consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskForCompensation {
    pub task: CompensationTask,
    pub claim: Claim,
    pub policy: Policy,
}
