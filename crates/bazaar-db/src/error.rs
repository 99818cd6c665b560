//! # Database Error Types
//!
//! Error types for database operations and the operation-level umbrella
//! error callers of the repositories see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (infrastructure) ──┐                                          │
//! │                             ├──► StoreError ──► transport layer        │
//! │  CoreError (business rule) ─┘        │                                 │
//! │                                      └── OrderNumberCollision          │
//! │                                          (the one fatal condition)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `StoreError::Domain` is recoverable by the caller and guaranteed
//! to have applied no partial state. `OrderNumberCollision` is treated as a
//! configuration fault: logged, aborted, never retried with the same number.

use thiserror::Error;

use bazaar_core::CoreError;

// =============================================================================
// Infrastructure Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unique constraint violation (e.g. duplicate order number or a
    /// cart line upsert race).
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

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

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE: "UNIQUE constraint failed: <table>.<column>"
                // FK:     "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
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

/// Result type for low-level database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Store Error
// =============================================================================

/// The error type every repository operation returns.
///
/// Splits cleanly into business-rule failures (callers can fix the request
/// and retry), infrastructure failures, and the one fatal condition.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A recoverable business-rule violation from bazaar-core.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// An infrastructure failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The generated order number already exists.
    ///
    /// Order numbers are time-derived and must be unique; a collision means
    /// the generator is misconfigured. The operation is aborted and rolled
    /// back, and is never retried with a duplicate number.
    #[error("Duplicate order number generated: {order_number}")]
    OrderNumberCollision { order_number: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Db(DbError::from(err))
    }
}

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
