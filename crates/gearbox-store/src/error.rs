//! # Storage Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Categorized: constraint, pool, query       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutError (gearbox-core) ← What the trait contracts speak         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← JSON body with a stable error code              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain conditions the SQL layer can decide itself (insufficient stock,
//! state conflicts) are raised directly as `CheckoutError` at the query
//! site; `StoreError` covers the infrastructure failures underneath.

use thiserror::Error;

use gearbox_core::CheckoutError;

/// Storage infrastructure errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or pool setup failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Unique constraint violation, e.g. re-inserting a sale id.
    #[error("duplicate {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Pool exhausted, all connections in use.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database      → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut  → StoreError::PoolExhausted
/// sqlx::Error::PoolClosed    → StoreError::ConnectionFailed
/// Other                      → StoreError::QueryFailed
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StoreError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    StoreError::ForeignKeyViolation(msg.to_string())
                } else {
                    StoreError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("pool is closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::CorruptRow(format!("column {index}: {source}"))
            }

            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Everything the checkout layer sees from this crate is a `Persistence`
/// error; domain errors never travel through `StoreError`.
impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        CheckoutError::Persistence(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
