use thiserror::Error;

/// Errors that can occur when interacting with the shop store.
///
/// Stores never decide request-level semantics: a lookup miss is an
/// `Ok(None)`, not an error. Only genuine storage failures and constraint
/// violations surface here; the service layer classifies them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database unique constraint was violated.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The storage backend failed mid-operation.
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
