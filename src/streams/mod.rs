//! # Stream Intake
//!
//! Consumer-group intake from the durable compensation stream: a thin
//! client over the broker's group primitives and a strict decoder that
//! turns raw batch replies into ordered task identifiers.

pub mod client;
pub mod decoder;
pub mod errors;

pub use client::StreamClient;
pub use decoder::decode_task_ids;
pub use errors::{DecodeError, StreamError};
