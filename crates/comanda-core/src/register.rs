//! # Cash Register State Machine
//!
//! Models the till: open with a float, accept cash movements, close
//! against a manual count.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cash Register Lifecycle                            │
//! │                                                                         │
//! │  NoRegister ──open(operator, float)──► Open ──close(counted)──► Closed │
//! │                                          │                              │
//! │                                          ├── movement(Addition, ...)    │
//! │                                          ├── movement(Withdrawal, ...)  │
//! │                                          └── cash orders accumulate     │
//! │                                              (external store)           │
//! │                                                                         │
//! │  On close:                                                             │
//! │    expected = initial + cash sales + Σ additions − Σ withdrawals       │
//! │    difference = counted − expected    (frozen forever)                 │
//! │                                                                         │
//! │    difference > 0  ⇒  surplus                                          │
//! │    difference < 0  ⇒  shortage                                         │
//! │    difference = 0  ⇒  exact                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expected cash is recomputed on demand, never cached: it depends on
//! externally-stored orders and movements that can change between polls.
//! Cash sales are aggregated from the itemized payment breakdown of each
//! order — a split order contributes only its cash-tagged portion.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{CashMovement, CashRegister, MovementKind, OrderPayment, RegisterStatus};
use crate::validation::{
    validate_cash_amount, validate_movement_reason, validate_operator_name,
    validate_positive_amount,
};

// =============================================================================
// Cash Variance
// =============================================================================

/// The trichotomy reported when a register closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashVariance {
    /// Counted more than expected.
    Surplus,
    /// Counted less than expected.
    Shortage,
    /// Counted exactly what was expected.
    Exact,
}

impl CashVariance {
    /// Classifies a `counted − expected` difference.
    pub const fn from_difference(difference_cents: i64) -> Self {
        if difference_cents > 0 {
            CashVariance::Surplus
        } else if difference_cents < 0 {
            CashVariance::Shortage
        } else {
            CashVariance::Exact
        }
    }

    /// Stable label for receipts and reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CashVariance::Surplus => "surplus",
            CashVariance::Shortage => "shortage",
            CashVariance::Exact => "exact",
        }
    }
}

// =============================================================================
// Pure Till Arithmetic
// =============================================================================

/// The till balance the system predicts should be present at close.
///
/// `initial + cash_sales + Σ additions − Σ withdrawals`
///
/// ## Example
/// ```rust
/// use comanda_core::register::expected_cash_cents;
/// use comanda_core::types::{CashMovement, MovementKind};
/// use chrono::Utc;
///
/// let movements = vec![
///     CashMovement {
///         id: "m1".into(),
///         cash_register_id: "r1".into(),
///         kind: MovementKind::Addition,
///         amount_cents: 5000,
///         reason: "reforço".into(),
///         performed_by: "Maria".into(),
///         created_at: Utc::now(),
///     },
///     CashMovement {
///         id: "m2".into(),
///         cash_register_id: "r1".into(),
///         kind: MovementKind::Withdrawal,
///         amount_cents: 3000,
///         reason: "sangria".into(),
///         performed_by: "Maria".into(),
///         created_at: Utc::now(),
///     },
/// ];
///
/// assert_eq!(expected_cash_cents(10000, 25000, &movements), 37000);
/// ```
pub fn expected_cash_cents(
    initial_cash_cents: i64,
    cash_sales_cents: i64,
    movements: &[CashMovement],
) -> i64 {
    let additions: i64 = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Addition)
        .map(|m| m.amount_cents)
        .sum();
    let withdrawals: i64 = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Withdrawal)
        .map(|m| m.amount_cents)
        .sum();

    initial_cash_cents + cash_sales_cents + additions - withdrawals
}

/// Sums the cash-tagged portion of an itemized payment breakdown.
///
/// A split order (cash + card) contributes only its cash slice to the
/// till. The legacy flat `payment_method` column is never consulted.
pub fn cash_portion_cents(payments: &[OrderPayment]) -> i64 {
    payments
        .iter()
        .filter(|p| p.method.is_cash())
        .map(|p| p.amount_cents)
        .sum()
}

// =============================================================================
// State Machine
// =============================================================================

impl CashRegister {
    /// Opens a new register.
    ///
    /// ## Validation
    /// - Operator name must be non-empty
    /// - Opening float must be non-negative (zero is a valid empty till)
    ///
    /// Whether another register is already open for this operator is
    /// enforced by the store (unique open-register index) and by the
    /// session layer; this constructor only validates its own inputs.
    pub fn open(operator: &str, initial_cash_cents: i64) -> CoreResult<CashRegister> {
        validate_operator_name(operator)?;
        validate_cash_amount("initial cash", initial_cash_cents)?;

        Ok(CashRegister {
            id: Uuid::new_v4().to_string(),
            opened_by: operator.trim().to_string(),
            opened_at: Utc::now(),
            initial_cash_cents,
            status: RegisterStatus::Open,
            closed_at: None,
            counted_cash_cents: None,
            expected_cash_cents: None,
            difference_cents: None,
        })
    }

    /// Whether the register still accepts movements and orders.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }

    /// Builds a movement against this register.
    ///
    /// ## Validation
    /// - Register must be open (`RegisterClosed` otherwise)
    /// - Amount must be positive
    /// - Reason must be non-empty
    ///
    /// The returned movement is append-only data; persisting it is the
    /// store's job.
    pub fn movement(
        &self,
        kind: MovementKind,
        amount_cents: i64,
        reason: &str,
        performed_by: &str,
    ) -> CoreResult<CashMovement> {
        if !self.is_open() {
            return Err(CoreError::RegisterClosed {
                register_id: self.id.clone(),
            });
        }

        validate_positive_amount("movement amount", amount_cents)?;
        validate_movement_reason(reason)?;
        validate_operator_name(performed_by)?;

        Ok(CashMovement {
            id: Uuid::new_v4().to_string(),
            cash_register_id: self.id.clone(),
            kind,
            amount_cents,
            reason: reason.trim().to_string(),
            performed_by: performed_by.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    /// Closes the register against a manual cash count.
    ///
    /// Computes and freezes `expected_cash_cents` and
    /// `difference_cents = counted − expected`; the record is immutable
    /// afterwards. A second close fails with `RegisterClosed` and leaves
    /// the frozen values untouched.
    pub fn close(
        &mut self,
        counted_cash_cents: i64,
        expected_cash_cents: i64,
    ) -> CoreResult<CashVariance> {
        if !self.is_open() {
            return Err(CoreError::RegisterClosed {
                register_id: self.id.clone(),
            });
        }

        validate_cash_amount("counted cash", counted_cash_cents)?;

        let difference = counted_cash_cents - expected_cash_cents;

        self.status = RegisterStatus::Closed;
        self.closed_at = Some(Utc::now());
        self.counted_cash_cents = Some(counted_cash_cents);
        self.expected_cash_cents = Some(expected_cash_cents);
        self.difference_cents = Some(difference);

        Ok(CashVariance::from_difference(difference))
    }

    /// The variance of a closed register, if it has been closed.
    pub fn variance(&self) -> Option<CashVariance> {
        self.difference_cents.map(CashVariance::from_difference)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::Utc;

    fn movement(kind: MovementKind, amount_cents: i64) -> CashMovement {
        CashMovement {
            id: Uuid::new_v4().to_string(),
            cash_register_id: "r1".to_string(),
            kind,
            amount_cents,
            reason: "troco".to_string(),
            performed_by: "Maria".to_string(),
            created_at: Utc::now(),
        }
    }

    fn payment(method: PaymentMethod, amount_cents: i64) -> OrderPayment {
        OrderPayment {
            id: Uuid::new_v4().to_string(),
            order_id: "o1".to_string(),
            method,
            amount_cents,
            tendered_cents: None,
            change_cents: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_validates_inputs() {
        assert!(CashRegister::open("Maria", 10000).is_ok());
        assert!(CashRegister::open("Maria", 0).is_ok());

        assert!(CashRegister::open("", 10000).is_err());
        assert!(CashRegister::open("   ", 10000).is_err());
        assert!(CashRegister::open("Maria", -1).is_err());
    }

    #[test]
    fn test_expected_cash_formula() {
        let movements = vec![
            movement(MovementKind::Addition, 5000),
            movement(MovementKind::Withdrawal, 3000),
        ];
        assert_eq!(expected_cash_cents(10000, 25000, &movements), 37000);
        assert_eq!(expected_cash_cents(10000, 25000, &[]), 35000);
    }

    #[test]
    fn test_cash_portion_ignores_other_methods() {
        let payments = vec![
            payment(PaymentMethod::Cash, 4000),
            payment(PaymentMethod::Credit, 2380),
            payment(PaymentMethod::Cash, 1000),
            payment(PaymentMethod::Pix, 700),
        ];
        // Only the cash slices of the split count towards the till
        assert_eq!(cash_portion_cents(&payments), 5000);
    }

    #[test]
    fn test_movement_guards() {
        let register = CashRegister::open("Maria", 10000).unwrap();

        let m = register
            .movement(MovementKind::Withdrawal, 3000, "troco", "Maria")
            .unwrap();
        assert_eq!(m.cash_register_id, register.id);
        assert_eq!(m.amount_cents, 3000);

        assert!(register
            .movement(MovementKind::Withdrawal, 0, "troco", "Maria")
            .is_err());
        assert!(register
            .movement(MovementKind::Withdrawal, -100, "troco", "Maria")
            .is_err());
        assert!(register
            .movement(MovementKind::Addition, 100, "", "Maria")
            .is_err());
    }

    #[test]
    fn test_movement_against_closed_register() {
        let mut register = CashRegister::open("Maria", 10000).unwrap();
        register.close(10000, 10000).unwrap();

        let err = register
            .movement(MovementKind::Addition, 100, "reforço", "Maria")
            .unwrap_err();
        assert!(matches!(err, CoreError::RegisterClosed { .. }));
    }

    /// Register opened with 100,00; cash sales 250,00; one 30,00
    /// withdrawal: expected 320,00. Counting 315,00 closes 5,00 short.
    #[test]
    fn test_shortage_scenario() {
        let mut register = CashRegister::open("Maria", 10000).unwrap();
        let withdrawal = register
            .movement(MovementKind::Withdrawal, 3000, "troco", "Maria")
            .unwrap();

        let expected = expected_cash_cents(10000, 25000, &[withdrawal]);
        assert_eq!(expected, 32000);

        let variance = register.close(31500, expected).unwrap();
        assert_eq!(variance, CashVariance::Shortage);
        assert_eq!(register.difference_cents, Some(-500));
        assert_eq!(register.expected_cash_cents, Some(32000));
        assert_eq!(register.counted_cash_cents, Some(31500));
    }

    #[test]
    fn test_close_rejects_negative_count() {
        let mut register = CashRegister::open("Maria", 10000).unwrap();
        assert!(register.close(-1, 10000).is_err());
        // Failed validation leaves the register open
        assert!(register.is_open());
    }

    /// Closing a second time fails and leaves the frozen difference
    /// exactly as the first close computed it.
    #[test]
    fn test_double_close_rejected_and_frozen() {
        let mut register = CashRegister::open("Maria", 10000).unwrap();

        let variance = register.close(31500, 32000).unwrap();
        assert_eq!(variance, CashVariance::Shortage);

        let err = register.close(99999, 0).unwrap_err();
        assert!(matches!(err, CoreError::RegisterClosed { .. }));
        assert_eq!(register.difference_cents, Some(-500));
        assert_eq!(register.variance(), Some(CashVariance::Shortage));
    }

    #[test]
    fn test_variance_trichotomy() {
        assert_eq!(CashVariance::from_difference(500), CashVariance::Surplus);
        assert_eq!(CashVariance::from_difference(-500), CashVariance::Shortage);
        assert_eq!(CashVariance::from_difference(0), CashVariance::Exact);

        assert_eq!(CashVariance::Surplus.as_str(), "surplus");
        assert_eq!(CashVariance::Shortage.as_str(), "shortage");
        assert_eq!(CashVariance::Exact.as_str(), "exact");
    }
}
