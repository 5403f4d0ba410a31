//! # Collaborator Seams
//!
//! The narrow interfaces this core consumes from its environment. No wire
//! format is owned here: every operation is an abstract async call against
//! an injected implementation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Injected Collaborators                              │
//! │                                                                         │
//! │  OrderStore      insert / get / list / append / settle / cash total    │
//! │  RegisterStore   insert / find open / close / movements                │
//! │  StockLedger     deduct(line items)                                    │
//! │  ReceiptPrinter  print receipt / kitchen ticket (fire-and-forget)      │
//! │                                                                         │
//! │  Production wiring: comanda-db repositories (see adapters module).     │
//! │  Tests may inject anything that satisfies the traits.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::ServiceResult;
use comanda_core::{
    CashMovement, CashRegister, CheckoutSummary, Order, OrderItem, OrderPayment, OrderStatus,
};

/// Filter for order listings.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub cash_register_id: Option<String>,
    pub status: Option<OrderStatus>,
}

/// Persistent store for orders and their itemized payments.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes an order with its items and payments atomically.
    async fn insert(
        &self,
        order: &Order,
        items: &[OrderItem],
        payments: &[OrderPayment],
    ) -> ServiceResult<()>;

    async fn get(&self, id: &str) -> ServiceResult<Option<Order>>;

    async fn list(&self, query: &OrderQuery) -> ServiceResult<Vec<Order>>;

    async fn items(&self, order_id: &str) -> ServiceResult<Vec<OrderItem>>;

    async fn payments(&self, order_id: &str) -> ServiceResult<Vec<OrderPayment>>;

    /// Appends items to an order that is still open (table service).
    async fn append_items(&self, order_id: &str, items: &[OrderItem]) -> ServiceResult<()>;

    /// Settles an open order with the confirmed checkout outcome.
    async fn settle(
        &self,
        order_id: &str,
        summary: &CheckoutSummary,
        payments: &[OrderPayment],
    ) -> ServiceResult<()>;

    /// Cancels an order that is still open.
    async fn cancel(&self, order_id: &str) -> ServiceResult<()>;

    /// Cash taken for a till, aggregated from the itemized breakdown.
    async fn cash_sales_total(&self, register_id: &str) -> ServiceResult<i64>;
}

/// Persistent store for cash registers and their movements.
#[async_trait]
pub trait RegisterStore: Send + Sync {
    async fn insert(&self, register: &CashRegister) -> ServiceResult<()>;

    /// The single authoritative "is a till open for this operator" read.
    async fn find_open_by_operator(&self, operator: &str) -> ServiceResult<Option<CashRegister>>;

    /// Persists a close; fails if the register is not open any more.
    async fn close(&self, register: &CashRegister) -> ServiceResult<()>;

    async fn insert_movement(&self, movement: &CashMovement) -> ServiceResult<()>;

    async fn movements(&self, register_id: &str) -> ServiceResult<Vec<CashMovement>>;
}

/// Stock deduction collaborator.
///
/// Callers sequence `deduct` strictly after the order write succeeds.
#[async_trait]
pub trait StockLedger: Send + Sync {
    async fn deduct(&self, items: &[OrderItem]) -> ServiceResult<()>;
}

/// Printing collaborator. Fire-and-forget: the core never consumes a
/// return value beyond surfacing failures in the log.
#[async_trait]
pub trait ReceiptPrinter: Send + Sync {
    async fn print_receipt(
        &self,
        order: &Order,
        items: &[OrderItem],
        payments: &[OrderPayment],
    ) -> ServiceResult<()>;

    async fn print_kitchen_ticket(&self, items: &[OrderItem]) -> ServiceResult<()>;
}
