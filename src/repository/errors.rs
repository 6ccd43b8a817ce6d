//! Repository error types

use thiserror::Error;

/// Errors raised by business storage operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Database query error: {operation}: {message}")]
    DatabaseQuery { operation: String, message: String },

    #[error("Data integrity error: {entity}: {message}")]
    DataIntegrity { entity: String, message: String },
}

impl RepositoryError {
    /// Create a database connection error
    pub fn database_connection(message: impl Into<String>) -> Self {
        Self::DatabaseConnection {
            message: message.into(),
        }
    }

    /// Create a database query error
    pub fn database_query(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DatabaseQuery {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a data integrity error
    pub fn data_integrity(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                RepositoryError::database_connection(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                RepositoryError::database_query("database", db_err.to_string())
            }
            _ => RepositoryError::database_connection(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepositoryError::database_query("query_tasks", "relation does not exist");
        let display = format!("{err}");
        assert!(display.contains("query_tasks"));
        assert!(display.contains("relation does not exist"));
    }
}
