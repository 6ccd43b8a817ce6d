//! # Worker Loop
//!
//! Drives the end-to-end cycle: ensure the consumer group exists, then
//! forever — wait the poll interval, read a batch, decode it, dispatch it.
//! Any error escaping a cycle is logged and the loop continues at the next
//! interval; nothing below this loop is allowed to crash the process.
//!
//! Shutdown takes effect at the next suspension point, between cycles:
//! in-flight task processing always completes before the loop exits.

pub mod dispatcher;

pub use dispatcher::{BatchDispatcher, DispatchSummary};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::calculation::CalculationEngine;
use crate::config::QueueConfig;
use crate::constants::defaults;
use crate::error::Result;
use crate::repository::TaskRepository;
use crate::streams::{decode_task_ids, StreamClient};

/// Loop cadence and sizing
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between poll cycles
    pub poll_interval: Duration,
    /// Maximum entries requested per batch read
    pub batch_count: usize,
}

impl WorkerConfig {
    /// Derive loop settings from the queue configuration
    pub fn from_queue(queue: &QueueConfig) -> Self {
        Self {
            poll_interval: queue.poll_interval(),
            batch_count: queue.count,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            batch_count: defaults::BATCH_COUNT,
        }
    }
}

/// Polling worker over the compensation stream
pub struct Worker<R> {
    stream: StreamClient,
    dispatcher: BatchDispatcher<R>,
    config: WorkerConfig,
    running: AtomicBool,
    shutdown: Notify,
}

impl<R: TaskRepository> Worker<R> {
    /// Assemble a worker from its collaborators
    pub fn new(
        stream: StreamClient,
        repository: Arc<R>,
        engine: Arc<CalculationEngine>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            stream,
            dispatcher: BatchDispatcher::new(repository, engine),
            config,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Run the poll cycle until [`Worker::shutdown`] is called. Group
    /// bootstrap happens once up front; after that no cycle error
    /// terminates the loop.
    pub async fn run(&self) -> Result<()> {
        self.stream.ensure_group().await?;

        self.running.store(true, Ordering::Release);
        info!(
            stream_key = %self.stream.stream_key(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_count = self.config.batch_count,
            "Compensation worker started"
        );

        while self.running.load(Ordering::Acquire) {
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = self.shutdown.notified() => break,
            }
            if !self.running.load(Ordering::Acquire) {
                break;
            }

            if let Err(cycle_error) = self.run_cycle().await {
                error!(
                    error = %cycle_error,
                    "Poll cycle failed; retrying next interval"
                );
            }
        }

        info!("Compensation worker stopped");
        Ok(())
    }

    /// Signal the loop to stop at its next suspension point. In-flight
    /// task processing completes before the loop exits.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        self.shutdown.notify_waiters();
    }

    /// Whether the loop is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// One intake cycle: read, decode, dispatch
    async fn run_cycle(&self) -> Result<()> {
        let Some(reply) = self.stream.read_batch(self.config.batch_count).await? else {
            return Ok(());
        };

        let task_ids = decode_task_ids(&reply, self.stream.stream_key())?;
        if task_ids.is_empty() {
            return Ok(());
        }

        self.dispatcher.dispatch(&task_ids).await?;
        Ok(())
    }
}
