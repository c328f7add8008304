use thiserror::Error;

/// Custom error type for canon operations.
#[derive(Debug, Error)]
pub enum DramaturgError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Requested entity was not found.
    #[error("Not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding capability failed or returned something unusable.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The summarization capability failed.
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DramaturgError {
    /// Shorthand for a not-found error on a table/key pair.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        DramaturgError::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl From<surrealdb::Error> for DramaturgError {
    fn from(err: surrealdb::Error) -> Self {
        DramaturgError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DramaturgError {
    fn from(err: serde_json::Error) -> Self {
        DramaturgError::Database(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for DramaturgError {
    fn from(err: std::io::Error) -> Self {
        DramaturgError::Database(format!("I/O error: {}", err))
    }
}
