//! # Stream Client
//!
//! Thin wrapper over the broker's consumer-group primitives. The client
//! owns the full stream key (application prefix + queue key), the group
//! name, and this worker's consumer identity — all fixed at construction.
//! Acknowledgement is deliberately absent: redelivery safety comes from the
//! task status filter, not from broker-side acks.

use redis::aio::ConnectionManager;
use redis::streams::StreamReadReply;
use tracing::{debug, info};

use super::errors::StreamError;
use crate::config::QueueConfig;
use crate::constants::stream::{GROUP_START_ID, NEW_ENTRIES_ID};

/// Consumer-group client for the compensation stream
#[derive(Clone)]
pub struct StreamClient {
    connection: ConnectionManager,
    stream_key: String,
    group: String,
    consumer: String,
    block_ms: u64,
}

impl StreamClient {
    /// Connect to the broker and bind this worker's consumer identity
    pub async fn connect(
        url: &str,
        queue: &QueueConfig,
        consumer: String,
    ) -> Result<Self, StreamError> {
        let client =
            redis::Client::open(url).map_err(|e| StreamError::connection(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StreamError::connection(e.to_string()))?;

        let stream_key = queue.stream_key();
        info!(
            stream_key = %stream_key,
            group = %queue.group,
            consumer = %consumer,
            "Connected to stream broker"
        );

        Ok(Self {
            connection,
            stream_key,
            group: queue.group.clone(),
            consumer,
            block_ms: queue.block_ms,
        })
    }

    /// Build a client over an existing managed connection
    pub fn new(
        connection: ConnectionManager,
        stream_key: String,
        group: String,
        consumer: String,
        block_ms: u64,
    ) -> Self {
        Self {
            connection,
            stream_key,
            group,
            consumer,
            block_ms,
        }
    }

    /// Full stream key this client reads from
    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    /// Create the consumer group at the stream origin, creating the stream
    /// itself when absent. Safe to call repeatedly: a BUSYGROUP reply means
    /// the group already exists and is swallowed; any other error propagates.
    pub async fn ensure_group(&self) -> Result<(), StreamError> {
        let mut connection = self.connection.clone();
        let created: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_key)
            .arg(&self.group)
            .arg(GROUP_START_ID)
            .arg("MKSTREAM")
            .query_async(&mut connection)
            .await;

        match created {
            Ok(()) => {
                info!(
                    stream_key = %self.stream_key,
                    group = %self.group,
                    "Consumer group created"
                );
                Ok(())
            }
            Err(err) if err.code() == Some("BUSYGROUP") => {
                debug!(
                    stream_key = %self.stream_key,
                    group = %self.group,
                    "Consumer group already exists"
                );
                Ok(())
            }
            Err(err) => Err(StreamError::group_create(
                &self.stream_key,
                &self.group,
                err.to_string(),
            )),
        }
    }

    /// Read up to `count` entries never delivered to any consumer in the
    /// group. Blocks up to the configured window; `None` means the window
    /// elapsed with nothing to deliver. Entries returned become pending for
    /// this consumer inside the broker.
    pub async fn read_batch(&self, count: usize) -> Result<Option<StreamReadReply>, StreamError> {
        let mut connection = self.connection.clone();
        let reply: Option<StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(&self.consumer)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(self.block_ms)
            .arg("STREAMS")
            .arg(&self.stream_key)
            .arg(NEW_ENTRIES_ID)
            .query_async(&mut connection)
            .await
            .map_err(|e| StreamError::read(&self.stream_key, e.to_string()))?;

        if let Some(batch) = &reply {
            let entry_count: usize = batch.keys.iter().map(|key| key.ids.len()).sum();
            debug!(
                stream_key = %self.stream_key,
                consumer = %self.consumer,
                entry_count = entry_count,
                "Read batch from stream"
            );
        }

        Ok(reply)
    }
}
