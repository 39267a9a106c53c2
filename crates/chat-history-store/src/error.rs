//! Chat history error types.

use crate::schema::SchemaViolation;
use thiserror::Error;

/// Chat history error type.
#[derive(Error, Debug)]
pub enum ChatHistoryError {
    /// The referenced table is absent from the database catalog
    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    /// The table exists but does not have the canonical chat history columns
    #[error("Table {table} does not match the chat history schema: {}", format_violations(.violations))]
    SchemaMismatch {
        table: String,
        violations: Vec<SchemaViolation>,
    },

    /// Table name rejected by identifier sanitization
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Session id empty or too long for the session_id column
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be turned back into a message
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Blocking task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

impl ChatHistoryError {
    /// True for [`ChatHistoryError::TableNotFound`].
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound { .. })
    }

    /// True for [`ChatHistoryError::SchemaMismatch`].
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using ChatHistoryError.
pub type ChatHistoryResult<T> = Result<T, ChatHistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_lists_every_violation() {
        let err = ChatHistoryError::SchemaMismatch {
            table: "message_store".to_string(),
            violations: vec![
                SchemaViolation::MissingColumn("data".to_string()),
                SchemaViolation::Nullable("session_id".to_string()),
            ],
        };

        let text = err.to_string();
        assert!(text.contains("message_store"));
        assert!(text.contains("missing column data"));
        assert!(text.contains("session_id must be NOT NULL"));
        assert!(err.is_schema_mismatch());
        assert!(!err.is_table_not_found());
    }

    #[test]
    fn test_table_not_found_helper() {
        let err = ChatHistoryError::TableNotFound {
            table: "missing_table".to_string(),
        };
        assert!(err.is_table_not_found());
        assert_eq!(err.to_string(), "Table not found: missing_table");
    }
}
