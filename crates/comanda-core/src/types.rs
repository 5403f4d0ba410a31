//! # Domain Types
//!
//! Core domain types used throughout Comanda POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │  OrderPayment   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  order_number   │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  method         │       │
//! │  │  current_stock  │   │  total_cents    │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  CashRegister   │   │  CashMovement   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  initial_cash   │   │  kind           │   │  Cash           │       │
//! │  │  expected_cash  │   │  amount_cents   │   │  Credit         │       │
//! │  │  difference     │   │  reason         │   │  Debit          │       │
//! │  └─────────────────┘   └─────────────────┘   │  Pix            │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (order_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A menu item available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the menu and on receipts.
    pub name: String,

    /// Optional description for menu details.
    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Menu category ("burgers", "drinks", ...).
    pub category: Option<String>,

    /// Whether to track stock for this product.
    pub track_stock: bool,

    /// Current stock level (servings available).
    pub current_stock: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if product can be sold (in stock or doesn't track stock).
    pub fn can_sell(&self, quantity: i64) -> bool {
        if !self.track_stock {
            return true;
        }

        self.current_stock.unwrap_or(0) >= quantity
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is open (table service: items may still be appended).
    Open,
    /// Order has been paid and finalized.
    Completed,
    /// Order was canceled.
    Canceled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash (counts towards the till).
    Cash,
    /// Credit card on external terminal.
    Credit,
    /// Debit card on external terminal.
    Debit,
    /// Pix instant transfer.
    Pix,
}

impl PaymentMethod {
    /// Stable lowercase label, used for the legacy display-only
    /// `payment_method` column and for receipts.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Pix => "pix",
        }
    }

    /// Whether this method moves physical cash through the till.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Order
// =============================================================================

/// An emitted order.
///
/// Immutable once created, except for the status transition
/// Open → Completed/Canceled and item appends while still Open
/// (table service).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable business identifier, e.g. `20260807-0042`.
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub service_charge_cents: i64,
    pub tip_cents: i64,
    pub couvert_cents: i64,
    pub total_cents: i64,
    /// Display-only summary of how the order was paid ("cash", "split", ...).
    /// Reconciliation NEVER reads this column; it reads the itemized
    /// `order_payments` rows instead.
    pub payment_method: String,
    /// Till this order was sold under, if a register was open.
    pub cash_register_id: Option<String>,
    /// Operator who emitted the order.
    pub operator: String,
    /// Optional customer name (table service, loyalty lookups).
    pub customer: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an emitted order.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Order Payment
// =============================================================================

/// One payment towards an order.
///
/// An order holds an ordered sequence of these for split tender; the
/// itemized breakdown is what till reconciliation aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderPayment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    /// Amount applied to the bill, in cents.
    pub amount_cents: i64,
    /// For cash: amount the customer handed over (to calculate change).
    pub tendered_cents: Option<i64>,
    /// For cash: change returned to the customer.
    pub change_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderPayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Register
// =============================================================================

/// The status of a cash register (till).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    /// Register accepting movements and orders.
    Open,
    /// Terminal, immutable record.
    Closed,
}

/// A till session bounded by open/close actions.
///
/// `expected_cash_cents` and `difference_cents` stay `None` while the
/// register is open; closing computes and freezes both.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    /// Operator who opened the register.
    pub opened_by: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    /// Opening float, in cents.
    pub initial_cash_cents: i64,
    pub status: RegisterStatus,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Manually counted cash at close.
    pub counted_cash_cents: Option<i64>,
    /// Frozen at close: initial + cash sales + additions − withdrawals.
    pub expected_cash_cents: Option<i64>,
    /// Frozen at close: counted − expected.
    pub difference_cents: Option<i64>,
}

// =============================================================================
// Cash Movement
// =============================================================================

/// The direction of a manual cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Cash taken out of the till (sangria).
    Withdrawal,
    /// Cash put into the till (reforço).
    Addition,
}

/// A manual cash-in/cash-out event against an open register.
/// Created only while the owning register is open; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub cash_register_id: String,
    pub kind: MovementKind,
    pub amount_cents: i64,
    /// Why the cash moved ("troco", "pagamento fornecedor", ...).
    pub reason: String,
    pub performed_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(track_stock: bool, stock: Option<i64>) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Burger".to_string(),
            description: None,
            price_cents: 2500,
            category: Some("burgers".to_string()),
            track_stock,
            current_stock: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell_without_stock_tracking() {
        let p = product(false, None);
        assert!(p.can_sell(1000));
    }

    #[test]
    fn test_can_sell_with_stock_tracking() {
        let p = product(true, Some(3));
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));

        let empty = product(true, None);
        assert!(!empty.can_sell(1));
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Open);
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Cash.as_str(), "cash");
        assert_eq!(PaymentMethod::Pix.as_str(), "pix");
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::Credit.is_cash());
    }
}
