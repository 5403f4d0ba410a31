//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                       │
//! │  ├── CoreError        - Checkout/till rule violations                  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  comanda-service errors (separate crate)                               │
//! │  └── ServiceError     - What callers of the service layer see          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ServiceError → UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent checkout or till rule violations. Every one is
/// recoverable at the UI-interaction level; none aborts the process.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout attempted with no items in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product is not in the cart.
    #[error("Product not in cart: {0}")]
    ProductNotInCart(String),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Payment amount is invalid (zero or negative).
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Order confirmation attempted before the bill was fully paid.
    ///
    /// Carries the remaining balance so the UI can display exactly how
    /// much is still owed.
    #[error("Payment incomplete: {remaining_cents} cents still owed")]
    IncompletePayment { remaining_cents: i64 },

    /// A mutation was attempted against a register that is not open.
    ///
    /// ## When This Occurs
    /// - Recording a movement after the register closed
    /// - Closing a register a second time
    ///
    /// Must never be silently swallowed; the attempted mutation is
    /// rejected and the frozen record stays untouched.
    #[error("Cash register {register_id} is closed")]
    RegisterClosed { register_id: String },

    /// No register is currently open for this session.
    #[error("No open cash register")]
    NoOpenRegister,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::IncompletePayment {
            remaining_cents: 2380,
        };
        assert_eq!(err.to_string(), "Payment incomplete: 2380 cents still owed");

        let err = CoreError::RegisterClosed {
            register_id: "reg-1".to_string(),
        };
        assert_eq!(err.to_string(), "Cash register reg-1 is closed");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "operator".to_string(),
        };
        assert_eq!(err.to_string(), "operator is required");

        let err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reason".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
