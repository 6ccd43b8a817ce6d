//! # Message Decoder
//!
//! Validates the raw per-key reply of a batch read and extracts task
//! identifiers in delivery order. Validation is strict and whole-batch: one
//! malformed entry rejects the entire reply, the worker loop logs the named
//! reason, and the cycle retries later. Entries must carry exactly one
//! field, named `tid`, holding a non-empty identifier.

use redis::streams::StreamReadReply;
use redis::Value;

use super::errors::DecodeError;
use crate::constants::stream::TASK_ID_FIELD;

/// Decode a batch reply into ordered task identifiers
pub fn decode_task_ids(
    reply: &StreamReadReply,
    expected_key: &str,
) -> Result<Vec<String>, DecodeError> {
    if reply.keys.is_empty() {
        return Err(DecodeError::MissingStreamKey);
    }
    if reply.keys.len() > 1 {
        return Err(DecodeError::UnexpectedKeyCount {
            count: reply.keys.len(),
        });
    }

    let stream = &reply.keys[0];
    if stream.key != expected_key {
        return Err(DecodeError::StreamKeyMismatch {
            expected: expected_key.to_string(),
            actual: stream.key.clone(),
        });
    }

    let mut task_ids = Vec::with_capacity(stream.ids.len());
    for (position, entry) in stream.ids.iter().enumerate() {
        if entry.id.is_empty() {
            return Err(DecodeError::MissingEntryId { position });
        }

        if let Some(field) = entry.map.keys().find(|key| key.as_str() != TASK_ID_FIELD) {
            return Err(DecodeError::UnexpectedField {
                entry_id: entry.id.clone(),
                field: field.clone(),
            });
        }
        let value = entry
            .map
            .get(TASK_ID_FIELD)
            .ok_or_else(|| DecodeError::MissingTaskIdField {
                entry_id: entry.id.clone(),
            })?;

        let task_id = match value {
            Value::BulkString(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|_| DecodeError::InvalidTaskIdValue {
                    entry_id: entry.id.clone(),
                })?
            }
            Value::SimpleString(text) => text.clone(),
            Value::Int(number) => number.to_string(),
            _ => {
                return Err(DecodeError::InvalidTaskIdValue {
                    entry_id: entry.id.clone(),
                })
            }
        };
        if task_id.is_empty() {
            return Err(DecodeError::EmptyTaskId {
                entry_id: entry.id.clone(),
            });
        }

        task_ids.push(task_id);
    }

    Ok(task_ids)
}
