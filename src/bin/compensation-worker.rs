//! # Compensation Worker Binary
//!
//! Entry point for the auto-compensation worker process. Wires
//! configuration, storage, the stream client, and the calculation engine
//! together, then runs the poll loop until a shutdown signal arrives.

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use compensation_core::calculation::CalculationEngine;
use compensation_core::config::ConfigManager;
use compensation_core::logging;
use compensation_core::repository::PgTaskRepository;
use compensation_core::streams::StreamClient;
use compensation_core::worker::{Worker, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    let manager = ConfigManager::load()?;
    let config = manager.config();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.pool)
        .connect(&config.database.url())
        .await?;
    let repository = Arc::new(PgTaskRepository::new(pool));

    // Deployments register their formula strategies here, before the loop
    // starts; the engine is shared read-only afterwards
    let engine = Arc::new(CalculationEngine::new());

    let consumer = config.queue.resolve_consumer_id();
    let stream = StreamClient::connect(&config.redis.url(), &config.queue, consumer).await?;

    let worker = Arc::new(Worker::new(
        stream,
        repository,
        engine,
        WorkerConfig::from_queue(&config.queue),
    ));

    let runner = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run().await })
    };

    signal::ctrl_c().await?;
    info!("Shutdown signal received; finishing in-flight tasks");
    worker.shutdown();

    match runner.await {
        Ok(result) => result?,
        Err(join_error) => error!(error = %join_error, "Worker task ended abnormally"),
    }

    Ok(())
}
