//! # Checkout Calculator
//!
//! Derives the final total of a bill from its subtotal and adjustments,
//! and tracks a sequence of partial payments against that total.
//!
//! ## The Bill Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Final Total Derivation                           │
//! │                                                                         │
//! │  subtotal (Σ cart line totals)                                         │
//! │     + service charge  (subtotal × service_charge%)                     │
//! │     + tip             (flat)                                           │
//! │     + couvert         (flat cover charge, e.g. live music)             │
//! │     − discount        (flat amount OR subtotal × discount%)            │
//! │  ──────────────────────────────────────────────                        │
//! │  = final total        (floored at R$ 0,00)                             │
//! │                                                                         │
//! │  Payments are then recorded against the final total:                   │
//! │                                                                         │
//! │  cash 40,00 ──► remaining 23,80 ──► credit 23,80 ──► remaining 0,00    │
//! │                                                                         │
//! │  Overpay is clamped: paying 100,00 on a 23,80 balance records 23,80    │
//! │  (cash keeps the full tender and the difference becomes change).       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is integer cents. Completion allows a one-cent tolerance
//! ([`PAYMENT_TOLERANCE_CENTS`](crate::PAYMENT_TOLERANCE_CENTS)) to absorb
//! rounding residue from percentage charges.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::types::PaymentMethod;
use crate::PAYMENT_TOLERANCE_CENTS;

// =============================================================================
// Discount
// =============================================================================

/// A discount applied to the subtotal: a flat amount or a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Discount {
    /// Flat amount in cents.
    Flat(i64),
    /// Percentage of the subtotal, in basis points.
    Percent(Rate),
}

impl Discount {
    /// Resolves the discount to cents for a given subtotal.
    pub fn value_cents(&self, subtotal_cents: i64) -> i64 {
        match self {
            Discount::Flat(cents) => *cents,
            Discount::Percent(rate) => Money::from_cents(subtotal_cents).apply_rate(*rate).cents(),
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::Flat(0)
    }
}

// =============================================================================
// Charge Adjustments
// =============================================================================

/// Everything that turns a subtotal into a final total.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChargeAdjustments {
    /// Discount (flat cents or percentage of subtotal).
    pub discount: Discount,

    /// Service charge percentage on the subtotal (1000 bps = 10%).
    pub service_charge: Rate,

    /// Voluntary tip, flat cents.
    pub tip_cents: i64,

    /// Cover charge (couvert artístico), flat cents.
    pub couvert_cents: i64,
}

impl ChargeAdjustments {
    /// The resolved discount value for a given subtotal.
    pub fn discount_cents(&self, subtotal_cents: i64) -> i64 {
        self.discount.value_cents(subtotal_cents)
    }

    /// The service charge value for a given subtotal.
    pub fn service_charge_cents(&self, subtotal_cents: i64) -> i64 {
        Money::from_cents(subtotal_cents)
            .apply_rate(self.service_charge)
            .cents()
    }

    /// The final total for a given subtotal, floored at zero.
    ///
    /// A discount larger than the rest of the bill clamps to R$ 0,00
    /// rather than producing a negative bill.
    pub fn final_total_cents(&self, subtotal_cents: i64) -> i64 {
        let raw = subtotal_cents + self.service_charge_cents(subtotal_cents) + self.tip_cents
            + self.couvert_cents
            - self.discount_cents(subtotal_cents);
        Money::from_cents(raw).clamp_non_negative().cents()
    }
}

// =============================================================================
// Payment Entry
// =============================================================================

/// One recorded payment within a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentEntry {
    pub method: PaymentMethod,

    /// Amount applied to the bill (already clamped to the balance).
    pub amount_cents: i64,

    /// For cash: the full amount the customer handed over.
    pub tendered_cents: Option<i64>,

    /// For cash: tendered − applied.
    pub change_cents: Option<i64>,
}

// =============================================================================
// Checkout
// =============================================================================

/// A checkout in progress: frozen totals plus an ordered payment list.
///
/// Totals are computed once at construction from the cart subtotal and the
/// adjustments; payments are then added and removed against the frozen
/// total. Recomputing on a cart change means constructing a fresh
/// `Checkout` — the calculator itself never observes the cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Checkout {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub service_charge_cents: i64,
    pub tip_cents: i64,
    pub couvert_cents: i64,
    pub total_cents: i64,
    payments: Vec<PaymentEntry>,
}

impl Checkout {
    /// Builds a checkout for a subtotal under the given adjustments.
    pub fn new(subtotal_cents: i64, adjustments: &ChargeAdjustments) -> Self {
        Checkout {
            subtotal_cents,
            discount_cents: adjustments.discount_cents(subtotal_cents),
            service_charge_cents: adjustments.service_charge_cents(subtotal_cents),
            tip_cents: adjustments.tip_cents,
            couvert_cents: adjustments.couvert_cents,
            total_cents: adjustments.final_total_cents(subtotal_cents),
            payments: Vec::new(),
        }
    }

    /// The recorded payments, in the order they were added.
    pub fn payments(&self) -> &[PaymentEntry] {
        &self.payments
    }

    /// Sum of recorded payment amounts.
    pub fn total_paid_cents(&self) -> i64 {
        self.payments.iter().map(|p| p.amount_cents).sum()
    }

    /// Balance still owed. Never negative.
    pub fn remaining_cents(&self) -> i64 {
        (self.total_cents - self.total_paid_cents()).max(0)
    }

    /// Change due on a cash tender against the current balance.
    ///
    /// `max(0, tendered − owed)` where owed is the remaining balance
    /// (which equals the final total when no payments exist yet).
    pub fn change_due_cents(&self, tendered_cents: i64) -> i64 {
        (tendered_cents - self.remaining_cents()).max(0)
    }

    /// Records a payment.
    ///
    /// ## Behavior
    /// - Rejects `amount <= 0` with `InvalidPaymentAmount`
    /// - Clamps the applied amount to the remaining balance ("pay the
    ///   rest" shortcut) — the bill is never over-recorded
    /// - For cash, the full tender and the resulting change are kept on
    ///   the entry
    /// - On an already-settled bill nothing is recorded
    ///
    /// ## Returns
    /// The amount actually applied to the bill, in cents.
    pub fn add_payment(&mut self, method: PaymentMethod, amount_cents: i64) -> CoreResult<i64> {
        if amount_cents <= 0 {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("{} cents is not a payable amount", amount_cents),
            });
        }

        let applied = amount_cents.min(self.remaining_cents());
        if applied == 0 {
            return Ok(0);
        }

        let (tendered, change) = if method.is_cash() {
            (Some(amount_cents), Some(amount_cents - applied))
        } else {
            (None, None)
        };

        self.payments.push(PaymentEntry {
            method,
            amount_cents: applied,
            tendered_cents: tendered,
            change_cents: change,
        });

        Ok(applied)
    }

    /// Removes a recorded payment, re-opening its share of the balance.
    pub fn remove_payment(&mut self, index: usize) -> CoreResult<PaymentEntry> {
        if index >= self.payments.len() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("no payment at position {}", index),
            });
        }
        Ok(self.payments.remove(index))
    }

    /// Whether the bill is fully paid, within the one-cent tolerance.
    pub fn is_complete(&self) -> bool {
        self.total_paid_cents() >= self.total_cents - PAYMENT_TOLERANCE_CENTS
    }

    /// Total change owed across all cash entries.
    pub fn change_cents(&self) -> i64 {
        self.payments.iter().filter_map(|p| p.change_cents).sum()
    }

    /// Display-only summary of how the bill was paid.
    ///
    /// One method → its label; several → `"split"`; none (a fully
    /// discounted bill) → `"none"`. Reconciliation never reads this.
    pub fn method_summary(&self) -> String {
        let mut methods: Vec<&str> = self.payments.iter().map(|p| p.method.as_str()).collect();
        methods.dedup();
        match methods.as_slice() {
            [] => "none".to_string(),
            [only] => (*only).to_string(),
            _ => "split".to_string(),
        }
    }

    /// Finalizes the checkout for order emission.
    ///
    /// Fails with `IncompletePayment` (carrying the open balance) if the
    /// bill is not fully paid; the checkout is consumed on success so a
    /// confirmed payment set can never be mutated afterwards.
    pub fn confirm(self) -> CoreResult<CheckoutSummary> {
        if !self.is_complete() {
            return Err(CoreError::IncompletePayment {
                remaining_cents: self.remaining_cents(),
            });
        }

        let payment_method = self.method_summary();
        let change_cents = self.change_cents();

        Ok(CheckoutSummary {
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            service_charge_cents: self.service_charge_cents,
            tip_cents: self.tip_cents,
            couvert_cents: self.couvert_cents,
            total_cents: self.total_cents,
            payments: self.payments,
            payment_method,
            change_cents,
        })
    }
}

// =============================================================================
// Checkout Summary
// =============================================================================

/// The frozen output of a confirmed checkout, ready for order emission.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutSummary {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub service_charge_cents: i64,
    pub tip_cents: i64,
    pub couvert_cents: i64,
    pub total_cents: i64,
    pub payments: Vec<PaymentEntry>,
    /// Display-only method summary ("cash", "split", ...).
    pub payment_method: String,
    pub change_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_percent_service() -> ChargeAdjustments {
        ChargeAdjustments {
            service_charge: Rate::from_bps(1000),
            ..Default::default()
        }
    }

    /// 2× Burger @ 25,00 + 1× Soda @ 8,00 → subtotal 58,00;
    /// 10% service charge → final total 63,80.
    #[test]
    fn test_burger_soda_scenario() {
        let subtotal = 2 * 2500 + 800;
        let mut checkout = Checkout::new(subtotal, &ten_percent_service());

        assert_eq!(checkout.subtotal_cents, 5800);
        assert_eq!(checkout.service_charge_cents, 580);
        assert_eq!(checkout.total_cents, 6380);

        checkout.add_payment(PaymentMethod::Cash, 4000).unwrap();
        assert_eq!(checkout.remaining_cents(), 2380);
        assert!(!checkout.is_complete());

        checkout.add_payment(PaymentMethod::Credit, 2380).unwrap();
        assert_eq!(checkout.remaining_cents(), 0);
        assert!(checkout.is_complete());
    }

    #[test]
    fn test_flat_discount() {
        let adjustments = ChargeAdjustments {
            discount: Discount::Flat(500),
            ..Default::default()
        };
        assert_eq!(adjustments.final_total_cents(5800), 5300);
    }

    #[test]
    fn test_percent_discount() {
        let adjustments = ChargeAdjustments {
            discount: Discount::Percent(Rate::from_bps(1000)), // 10%
            ..Default::default()
        };
        assert_eq!(adjustments.discount_cents(5800), 580);
        assert_eq!(adjustments.final_total_cents(5800), 5220);
    }

    #[test]
    fn test_tip_and_couvert() {
        let adjustments = ChargeAdjustments {
            tip_cents: 300,
            couvert_cents: 1500,
            ..Default::default()
        };
        assert_eq!(adjustments.final_total_cents(5800), 7600);
    }

    #[test]
    fn test_oversized_discount_clamps_to_zero() {
        let adjustments = ChargeAdjustments {
            discount: Discount::Flat(99999),
            ..Default::default()
        };
        assert_eq!(adjustments.final_total_cents(5800), 0);
    }

    #[test]
    fn test_rejects_non_positive_payment() {
        let mut checkout = Checkout::new(5800, &ChargeAdjustments::default());

        assert!(matches!(
            checkout.add_payment(PaymentMethod::Cash, -500),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            checkout.add_payment(PaymentMethod::Pix, 0),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));

        // State untouched after the rejections
        assert!(checkout.payments().is_empty());
        assert_eq!(checkout.remaining_cents(), 5800);
    }

    #[test]
    fn test_overpay_is_clamped() {
        let mut checkout = Checkout::new(2380, &ChargeAdjustments::default());

        let applied = checkout.add_payment(PaymentMethod::Cash, 10000).unwrap();

        // Applied amount is the balance, not the tender
        assert_eq!(applied, 2380);
        assert_eq!(checkout.total_paid_cents(), 2380);
        assert_eq!(checkout.remaining_cents(), 0);

        // Cash keeps the tender and the difference as change
        let entry = &checkout.payments()[0];
        assert_eq!(entry.tendered_cents, Some(10000));
        assert_eq!(entry.change_cents, Some(7620));
        assert_eq!(checkout.change_cents(), 7620);
    }

    #[test]
    fn test_change_due() {
        let mut checkout = Checkout::new(6380, &ChargeAdjustments::default());

        // No payments yet: owed == final total
        assert_eq!(checkout.change_due_cents(7000), 620);

        checkout.add_payment(PaymentMethod::Credit, 4000).unwrap();
        // Partial payment exists: owed == remaining
        assert_eq!(checkout.change_due_cents(3000), 620);
        assert_eq!(checkout.change_due_cents(2000), 0);
    }

    #[test]
    fn test_remove_payment_reopens_balance() {
        let mut checkout = Checkout::new(6380, &ChargeAdjustments::default());

        checkout.add_payment(PaymentMethod::Cash, 4000).unwrap();
        checkout.add_payment(PaymentMethod::Credit, 2380).unwrap();
        assert!(checkout.is_complete());

        let removed = checkout.remove_payment(0).unwrap();
        assert_eq!(removed.amount_cents, 4000);
        assert!(!checkout.is_complete());
        assert_eq!(checkout.remaining_cents(), 4000);

        assert!(checkout.remove_payment(5).is_err());
    }

    #[test]
    fn test_completion_tolerance_is_one_cent() {
        let mut checkout = Checkout::new(1000, &ChargeAdjustments::default());

        checkout.add_payment(PaymentMethod::Pix, 998).unwrap();
        assert!(!checkout.is_complete());

        checkout.add_payment(PaymentMethod::Pix, 1).unwrap();
        // 999 paid on a 1000 bill: within the one-cent tolerance
        assert!(checkout.is_complete());
    }

    /// Property: appending any positive payment never flips `is_complete`
    /// from true back to false.
    #[test]
    fn test_payment_never_uncompletes() {
        let mut checkout = Checkout::new(5000, &ChargeAdjustments::default());
        checkout.add_payment(PaymentMethod::Cash, 5000).unwrap();
        assert!(checkout.is_complete());

        for amount in [1, 100, 99999] {
            checkout.add_payment(PaymentMethod::Cash, amount).unwrap();
            assert!(checkout.is_complete());
            // Nothing gets recorded against a settled bill
            assert_eq!(checkout.total_paid_cents(), 5000);
        }
    }

    #[test]
    fn test_method_summary() {
        let mut checkout = Checkout::new(5000, &ChargeAdjustments::default());
        assert_eq!(checkout.method_summary(), "none");

        checkout.add_payment(PaymentMethod::Cash, 2000).unwrap();
        assert_eq!(checkout.method_summary(), "cash");

        checkout.add_payment(PaymentMethod::Pix, 3000).unwrap();
        assert_eq!(checkout.method_summary(), "split");
    }

    #[test]
    fn test_confirm_incomplete_fails_with_balance() {
        let mut checkout = Checkout::new(6380, &ChargeAdjustments::default());
        checkout.add_payment(PaymentMethod::Cash, 4000).unwrap();

        match checkout.confirm().unwrap_err() {
            CoreError::IncompletePayment { remaining_cents } => {
                assert_eq!(remaining_cents, 2380);
            }
            other => panic!("expected IncompletePayment, got {}", other),
        }
    }

    #[test]
    fn test_confirm_produces_summary() {
        let mut checkout = Checkout::new(5800, &ten_percent_service());
        checkout.add_payment(PaymentMethod::Cash, 7000).unwrap();

        let summary = checkout.confirm().unwrap();
        assert_eq!(summary.subtotal_cents, 5800);
        assert_eq!(summary.service_charge_cents, 580);
        assert_eq!(summary.total_cents, 6380);
        assert_eq!(summary.payments.len(), 1);
        assert_eq!(summary.payment_method, "cash");
        assert_eq!(summary.change_cents, 620);
    }
}
