//! Live-broker integration tests for the stream client. These need a local
//! Redis and are ignored by default; run with `cargo test -- --ignored`.

use redis::AsyncCommands;

use compensation_core::config::QueueConfig;
use compensation_core::streams::{decode_task_ids, StreamClient};

const REDIS_URL: &str = "redis://127.0.0.1:6379/0";

fn test_queue(suffix: &str) -> QueueConfig {
    QueueConfig {
        key: format!("auto-compensate-it-{suffix}-{}", std::process::id()),
        group: "auto-compensate-it-group".to_string(),
        block_ms: 100,
        ..QueueConfig::default()
    }
}

async fn cleanup(stream_key: &str) {
    let client = redis::Client::open(REDIS_URL).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let _: i64 = conn.del(stream_key).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis
async fn group_creation_is_idempotent() {
    let queue = test_queue("group");
    let stream = StreamClient::connect(REDIS_URL, &queue, "consumer-it-1".to_string())
        .await
        .unwrap();

    stream.ensure_group().await.unwrap();
    // Second creation hits BUSYGROUP and must be swallowed
    stream.ensure_group().await.unwrap();

    cleanup(&queue.stream_key()).await;
}

#[tokio::test]
#[ignore] // Requires Redis
async fn added_entry_round_trips_through_decode() {
    let queue = test_queue("roundtrip");
    let stream = StreamClient::connect(REDIS_URL, &queue, "consumer-it-2".to_string())
        .await
        .unwrap();
    stream.ensure_group().await.unwrap();

    let client = redis::Client::open(REDIS_URL).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let _: String = conn
        .xadd(queue.stream_key(), "*", &[("tid", "42")])
        .await
        .unwrap();

    let reply = stream
        .read_batch(10)
        .await
        .unwrap()
        .expect("entry should be delivered");
    let task_ids = decode_task_ids(&reply, &queue.stream_key()).unwrap();
    assert_eq!(task_ids, vec!["42"]);

    // Entries never delivered to the group are exhausted now
    let empty = stream.read_batch(10).await.unwrap();
    let remaining = empty.map_or(0, |batch| {
        batch.keys.iter().map(|key| key.ids.len()).sum::<usize>()
    });
    assert_eq!(remaining, 0);

    cleanup(&queue.stream_key()).await;
}
