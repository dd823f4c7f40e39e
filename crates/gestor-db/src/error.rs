//! # Database Errors
//!
//! ```text
//!  sqlx::Error ──────┐
//!  MigrateError ─────┼──► DbError ──► ApiError (status + JSON body)
//!  CoreError ────────┘      │
//!  ValidationError ─────────┘ (wrapped as Domain)
//! ```
//!
//! Business rules run inside repository transactions, so a broken rule
//! comes back as [`DbError::Domain`] after the transaction rolled back.
//! SQLite constraint messages are translated into the names the API
//! reports: a clash on `idx_invoices_voided_invoice` reads as
//! "credit note". A writer that gave up waiting for the SQLite lock
//! (`SQLITE_BUSY`/`SQLITE_LOCKED`) becomes [`DbError::Conflict`].

use gestor_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE constraint fired: duplicate SKU or username, two orders
    /// numbered the same voucher, or a second credit note for an invoice.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The row changed between read and write, or another writer held the
    /// lock past `busy_timeout`; the caller may retry.
    #[error("Concurrent update: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `true` for errors a client can fix by retrying the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            DbError::Conflict(_) | DbError::PoolExhausted => true,
            DbError::UniqueViolation { field, .. } => field == "voucher number",
            _ => false,
        }
    }
}

/// Readable name for the columns listed in a SQLite UNIQUE message.
fn unique_field(columns: &str) -> String {
    let columns = columns.trim();
    if columns.starts_with("invoices.voucher_type") {
        "voucher number".to_string()
    } else if columns == "invoices.voided_invoice_id" {
        "credit note".to_string()
    } else if columns == "invoices.offline_id" {
        "offline id".to_string()
    } else {
        columns
            .split(", ")
            .map(|c| c.rsplit('.').next().unwrap_or(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `true` for SQLITE_BUSY, SQLITE_LOCKED and their extended codes.
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map_or(false, |c| matches!(c & 0xff, 5 | 6))
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if is_lock_contention(db_err.code().as_deref()) {
                    DbError::Conflict(msg.to_string())
                } else if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: unique_field(columns),
                        value: "unknown".to_string(),
                    }
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
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

pub type DbResult<T> = Result<T, DbError>;
