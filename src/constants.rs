//! # System Constants
//!
//! Constants that define the wire contract between the compensation worker,
//! the stream producer, and operator tooling. Status strings are shared with
//! the task tables and must not drift.

/// Stream wire contract
pub mod stream {
    /// The single payload field carried by every compensation message
    pub const TASK_ID_FIELD: &str = "tid";

    /// Consumer groups are created at the stream origin so a new group
    /// drains everything already appended
    pub const GROUP_START_ID: &str = "0-0";

    /// Special id requesting entries never delivered to any group consumer
    pub const NEW_ENTRIES_ID: &str = ">";
}

/// Default cadence and sizing, overridable through configuration
pub mod defaults {
    /// Pause between poll cycles in milliseconds
    pub const POLL_INTERVAL_MS: u64 = 2000;

    /// Maximum entries requested per batch read
    pub const BATCH_COUNT: usize = 10;

    /// How long a batch read blocks waiting for entries in milliseconds
    pub const BLOCK_MS: u64 = 1000;

    /// Application prefix applied to the queue key to form the stream key
    pub const STREAM_KEY_PREFIX: &str = "insbiz:";
}

/// Status groupings used by filters and operator queries
pub mod status_groups {
    use crate::models::TaskStatus;

    /// States a task can never leave
    pub const TERMINAL_STATUSES: &[TaskStatus] = &[TaskStatus::Succeed, TaskStatus::Failure];

    /// States eligible for pickup by the worker
    pub const READY_STATUSES: &[TaskStatus] = &[TaskStatus::Pending];
}
