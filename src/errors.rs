use sea_orm::error::DbErr;
use sea_orm::TransactionError;
use serde::Serialize;

/// Crate-wide error type returned by every service operation.
///
/// All domain failures are typed variants; callers match on the kind, never
/// on message text. Messages exist for logging and for the API layer that
/// translates them into user-facing copy.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// An operation was attempted from a state that does not permit it,
    /// e.g. approving an already-approved transfer request.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// A debit would drive a stock quantity negative. The triggering
    /// operation leaves all state unchanged.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    /// Opname finalize was called with no recorded counts (or on a session
    /// that was already finalized and cleared).
    #[error("Nothing to finalize")]
    NothingToFinalize,

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Unwraps the error produced by `DatabaseConnection::transaction`,
    /// flattening connection-level failures into `DatabaseError`.
    pub fn from_transaction(err: TransactionError<ServiceError>) -> Self {
        match err {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        }
    }

    /// True when a retry with the same idempotency key is safe and may
    /// succeed, i.e. the failure was in the storage layer rather than a
    /// domain rule.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::DatabaseError(_))
    }
}
