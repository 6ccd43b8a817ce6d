//! # Stream Error Types
//!
//! Structured error types for broker access and batch decoding. Decode
//! errors name the exact field and entry that failed validation so a bad
//! producer can be identified from the log line alone.

use thiserror::Error;

/// Errors raised by broker operations
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Stream connection error: {message}")]
    Connection { message: String },

    #[error("Failed to create consumer group '{group}' on '{stream_key}': {message}")]
    GroupCreate {
        stream_key: String,
        group: String,
        message: String,
    },

    #[error("Failed to read from '{stream_key}': {message}")]
    Read { stream_key: String, message: String },
}

impl StreamError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a group creation error
    pub fn group_create(
        stream_key: impl Into<String>,
        group: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::GroupCreate {
            stream_key: stream_key.into(),
            group: group.into(),
            message: message.into(),
        }
    }

    /// Create a batch read error
    pub fn read(stream_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            stream_key: stream_key.into(),
            message: message.into(),
        }
    }
}

impl From<redis::RedisError> for StreamError {
    fn from(err: redis::RedisError) -> Self {
        StreamError::connection(err.to_string())
    }
}

/// Errors raised while validating a batch reply. Any one of these aborts
/// the whole batch; no partial batch is ever processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("batch reply carries no stream keys")]
    MissingStreamKey,

    #[error("batch reply carries {count} stream keys, expected exactly one")]
    UnexpectedKeyCount { count: usize },

    #[error("batch reply belongs to stream '{actual}', expected '{expected}'")]
    StreamKeyMismatch { expected: String, actual: String },

    #[error("entry at position {position} has an empty message id")]
    MissingEntryId { position: usize },

    #[error("entry '{entry_id}' is missing the task id field")]
    MissingTaskIdField { entry_id: String },

    #[error("entry '{entry_id}' carries unexpected field '{field}'")]
    UnexpectedField { entry_id: String, field: String },

    #[error("entry '{entry_id}' has a non-textual task id value")]
    InvalidTaskIdValue { entry_id: String },

    #[error("entry '{entry_id}' has an empty task id")]
    EmptyTaskId { entry_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_display() {
        let err = StreamError::group_create("insbiz:auto-compensate", "group-1", "timed out");
        let display = format!("{err}");
        assert!(display.contains("insbiz:auto-compensate"));
        assert!(display.contains("group-1"));
        assert!(display.contains("timed out"));
    }

    #[test]
    fn test_decode_error_names_offending_entry() {
        let err = DecodeError::UnexpectedField {
            entry_id: "1700000000000-0".to_string(),
            field: "payload".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("1700000000000-0"));
        assert!(display.contains("payload"));
    }
}
