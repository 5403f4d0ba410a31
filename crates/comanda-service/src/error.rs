//! # Service Error Type
//!
//! Unified error type for the service layer.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Error Flow in Comanda POS                             │
//! │                                                                         │
//! │  CoreError (checkout/till rule broken)  ──┐                            │
//! │                                           ├──► ServiceError ──► UI     │
//! │  DbError (store failure, transient)     ──┘                            │
//! │                                                                         │
//! │  Store failures leave in-memory state untouched: the cart and the      │
//! │  recorded payments survive a failed order write, so the operator       │
//! │  retries without re-entering anything.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each variant carries a machine-readable [`ErrorCode`] so the frontend
//! can branch without parsing messages.

use serde::Serialize;
use thiserror::Error;

use comanda_core::CoreError;
use comanda_db::DbError;

/// Error codes for service responses.
///
/// ## Usage in Frontend
/// ```typescript
/// try {
///   await emitOrder(cart, checkout);
/// } catch (e) {
///   switch (e.code) {
///     case 'INCOMPLETE_PAYMENT':
///       showRemainingBalance(e.message);
///       break;
///     case 'VALIDATION_ERROR':
///       showForm(e.message);
///       break;
///     default:
///       showError('An error occurred');
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Checkout confirmed before the bill was fully paid
    IncompletePayment,

    /// Checkout attempted with an empty cart
    EmptyCart,

    /// Mutation against a register/order in the wrong state
    InvalidState,

    /// Resource not found (404)
    NotFound,

    /// Store operation failed (transient; retry is safe)
    StoreError,

    /// Internal error (500)
    Internal,
}

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A checkout or till rule was broken.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store rejected or failed an operation.
    #[error(transparent)]
    Db(#[from] DbError),

    /// This operator already has an open register (also caught by the
    /// store's unique index when two tabs race).
    #[error("Operator '{0}' already has an open cash register")]
    RegisterAlreadyOpen(String),

    /// An order the service expected to exist was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

impl ServiceError {
    /// Machine-readable code for frontend branching.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(core) => match core {
                CoreError::EmptyCart => ErrorCode::EmptyCart,
                CoreError::IncompletePayment { .. } => ErrorCode::IncompletePayment,
                CoreError::RegisterClosed { .. } | CoreError::NoOpenRegister => {
                    ErrorCode::InvalidState
                }
                CoreError::ProductNotInCart(_) => ErrorCode::NotFound,
                CoreError::CartTooLarge { .. }
                | CoreError::QuantityTooLarge { .. }
                | CoreError::InvalidPaymentAmount { .. }
                | CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            ServiceError::Db(db) => match db {
                DbError::NotFound { .. } => ErrorCode::InvalidState,
                DbError::UniqueViolation { .. } => ErrorCode::InvalidState,
                DbError::ForeignKeyViolation { .. } => ErrorCode::ValidationError,
                DbError::ConnectionFailed(_)
                | DbError::QueryFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::PoolExhausted
                | DbError::MigrationFailed(_) => ErrorCode::StoreError,
                DbError::Internal(_) => ErrorCode::Internal,
            },
            ServiceError::RegisterAlreadyOpen(_) => ErrorCode::InvalidState,
            ServiceError::OrderNotFound(_) => ErrorCode::NotFound,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================
