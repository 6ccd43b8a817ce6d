#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Compensation Core
//!
//! Background worker engine for automatic claim compensation.
//!
//! ## Overview
//!
//! New compensation tasks are announced on a durable Redis stream. A worker
//! process joins a consumer group on that stream, decodes task identifiers
//! from each delivered batch, loads the referenced claim aggregate from
//! PostgreSQL, runs the configured payout calculation, and settles the
//! outcome — `succeed` with the persisted payout, or `failure` with a
//! structured diagnostic for operator review.
//!
//! Delivery is at-least-once. Idempotency does not rely on broker
//! acknowledgement: a task is only ever picked up while its status is
//! `pending`, and the `pending → handling` transition is atomic in the
//! repository, so a redelivered message for an already-claimed or finished
//! task is logged and skipped.
//!
//! ## Module Organization
//!
//! - [`streams`] - Consumer-group stream client and batch decoder
//! - [`models`] - Compensation task, claim, and policy data types
//! - [`repository`] - Task repository contract and PostgreSQL implementation
//! - [`calculation`] - Payout calculation engine and formula registry
//! - [`processor`] - Per-task processing with failure capture
//! - [`worker`] - Polling loop, batch dispatch, and shutdown handling
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use compensation_core::calculation::CalculationEngine;
//! use compensation_core::config::ConfigManager;
//! use compensation_core::repository::PgTaskRepository;
//! use compensation_core::streams::StreamClient;
//! use compensation_core::worker::{Worker, WorkerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let pool = sqlx::PgPool::connect(&config.database.url()).await?;
//! let repository = Arc::new(PgTaskRepository::new(pool));
//! let engine = Arc::new(CalculationEngine::new());
//!
//! let consumer = config.queue.resolve_consumer_id();
//! let stream = StreamClient::connect(&config.redis.url(), &config.queue, consumer).await?;
//!
//! let worker = Worker::new(stream, repository, engine, WorkerConfig::from_queue(&config.queue));
//! worker.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod calculation;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod processor;
pub mod repository;
pub mod streams;
pub mod worker;

pub use config::{ConfigManager, CoreConfig, DatabaseConfig, QueueConfig, RedisConfig};
pub use error::{CoreError, Result};
pub use models::{
    AutoCompensate, Claim, ClaimInsured, CompensationTask, Policy, TaskForCompensation, TaskStatus,
};
pub use processor::{FailureKind, FailureReason, TaskOutcome, TaskProcessor};
pub use repository::{PgTaskRepository, TaskPatch, TaskRepository};
pub use worker::{DispatchSummary, Worker, WorkerConfig};
