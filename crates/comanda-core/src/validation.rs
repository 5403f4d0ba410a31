//! # Validation Module
//!
//! Input validation utilities for Comanda POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service call (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (one open register per operator)               │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## A Note on NaN
//! The original browser implementation had to guard every numeric field
//! against NaN from free-text inputs. Integer cents make that entire error
//! class unrepresentable here; only sign and range checks remain.

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an operator name (whoever opens a till or performs a movement).
///
/// ## Rules
/// - Must not be empty or whitespace-only
/// - Must be at most 100 characters
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_operator_name;
///
/// assert!(validate_operator_name("Maria").is_ok());
/// assert!(validate_operator_name("   ").is_err());
/// ```
pub fn validate_operator_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "operator".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "operator".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a cash movement reason.
///
/// ## Rules
/// - Must not be empty (every sangria/reforço needs a stated reason)
/// - Must be at most 200 characters
pub fn validate_movement_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a payment or movement amount in cents.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Paying or moving zero/negative cash is always a user error
pub fn validate_positive_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an opening float or counted cash amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a till can legitimately open or close empty)
pub fn validate_cash_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_operator_name() {
        assert!(validate_operator_name("Maria").is_ok());
        assert!(validate_operator_name("João da Silva").is_ok());

        assert!(validate_operator_name("").is_err());
        assert!(validate_operator_name("   ").is_err());
        assert!(validate_operator_name(&"A".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_movement_reason() {
        assert!(validate_movement_reason("troco").is_ok());
        assert!(validate_movement_reason("").is_err());
        assert!(validate_movement_reason(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount("amount", 100).is_ok());
        assert!(validate_positive_amount("amount", 0).is_err());
        assert!(validate_positive_amount("amount", -500).is_err());
    }

    #[test]
    fn test_validate_cash_amount() {
        assert!(validate_cash_amount("initial cash", 0).is_ok());
        assert!(validate_cash_amount("initial cash", 10000).is_ok());
        assert!(validate_cash_amount("initial cash", -1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
