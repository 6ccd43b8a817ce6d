//! # Core Error Types
//!
//! Central error enum for the compensation worker. Subsystem errors
//! (stream, decode, repository, calculation, configuration) are structured
//! thiserror enums defined next to their subsystems and wrapped here so the
//! worker loop and binary can hold a single error type.

use thiserror::Error;

use crate::calculation::CalculationError;
use crate::config::ConfigurationError;
use crate::repository::RepositoryError;
use crate::streams::{DecodeError, StreamError};

/// Top-level error for worker operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),
}

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_subsystem() {
        let err = CoreError::from(StreamError::connection("refused"));
        let display = format!("{err}");
        assert!(display.contains("Stream error"));
        assert!(display.contains("refused"));
    }
}
