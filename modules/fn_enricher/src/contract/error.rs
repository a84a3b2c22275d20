use thiserror::Error;

/// Errors returned by the user read/write path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserServiceError {
    #[error("User not found: {id}")]
    NotFound { id: i32 },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl UserServiceError {
    pub fn not_found(id: i32) -> Self {
        Self::NotFound { id }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }
}
