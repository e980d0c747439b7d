//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                 │
//! │                                                                      │
//! │  SQLite Error (sqlx::Error)                                          │
//! │       │                                                              │
//! │       ▼                                                              │
//! │  DbError (this module) ← adds context and categorization,            │
//! │       │                  separates retryable busy/conflict           │
//! │       │                  conditions from definite failures           │
//! │       ▼                                                              │
//! │  CheckoutError (checkout module) ← domain vs infrastructure          │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The distinction callers care about: a domain error means the commit
//! definitely did not happen;
//! a retryable DbError means the attempt lost a race and the same commit
//! can be replayed; anything else means "unknown, do not blindly retry".

use thiserror::Error;

/// SQLite primary result code for a locked database.
const SQLITE_BUSY: &str = "5";
/// SQLite extended code: write transaction started on a stale snapshot.
const SQLITE_BUSY_SNAPSHOT: &str = "517";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation. `field` holds `table.column` as
    /// reported by SQLite, which lets callers tell an idempotency-token
    /// collision from a pickup-code collision.
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The database was busy or a concurrent writer invalidated our
    /// snapshot. The transaction was rolled back; the whole commit can
    /// be safely retried from scratch.
    #[error("Write conflict, transaction rolled back: {0}")]
    Conflict(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether replaying the whole operation may succeed.
    ///
    /// True only for transient contention: busy/conflict aborts and an
    /// exhausted pool. Definite failures (not found, constraint
    /// violations) are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Conflict(_) | DbError::PoolExhausted)
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound      → DbError::NotFound
/// sqlx::Error::Database         → inspect code/message for the
///                                 constraint or busy condition
/// sqlx::Error::PoolTimedOut     → DbError::PoolExhausted
/// Other                         → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();
                let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();

                if code == SQLITE_BUSY
                    || code == SQLITE_BUSY_SNAPSHOT
                    || msg.contains("database is locked")
                {
                    DbError::Conflict(msg)
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: orders.pickup_code"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message: msg }
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contention_is_retryable() {
        assert!(DbError::Conflict("snapshot stale".into()).is_retryable());
        assert!(DbError::PoolExhausted.is_retryable());

        assert!(!DbError::not_found("Product", "p-1").is_retryable());
        assert!(!DbError::UniqueViolation {
            field: "orders.client_token".into()
        }
        .is_retryable());
        assert!(!DbError::QueryFailed("syntax".into()).is_retryable());
    }
}
