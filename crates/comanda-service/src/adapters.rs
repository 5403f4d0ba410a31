//! # Store Adapters
//!
//! Implementations of the collaborator traits over the comanda-db
//! repositories, plus a log-only printer for environments without
//! printing hardware.

use async_trait::async_trait;
use tracing::info;

use crate::collaborators::{OrderQuery, OrderStore, ReceiptPrinter, RegisterStore, StockLedger};
use crate::error::ServiceResult;
use comanda_core::{
    CashMovement, CashRegister, CheckoutSummary, Order, OrderItem, OrderPayment,
};
use comanda_db::{OrderFilter, OrderRepository, ProductRepository, RegisterRepository};

#[async_trait]
impl OrderStore for OrderRepository {
    async fn insert(
        &self,
        order: &Order,
        items: &[OrderItem],
        payments: &[OrderPayment],
    ) -> ServiceResult<()> {
        Ok(self.insert_order(order, items, payments).await?)
    }

    async fn get(&self, id: &str) -> ServiceResult<Option<Order>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn list(&self, query: &OrderQuery) -> ServiceResult<Vec<Order>> {
        let filter = OrderFilter {
            cash_register_id: query.cash_register_id.clone(),
            status: query.status,
        };
        Ok(OrderRepository::list(self, &filter).await?)
    }

    async fn items(&self, order_id: &str) -> ServiceResult<Vec<OrderItem>> {
        Ok(self.get_items(order_id).await?)
    }

    async fn payments(&self, order_id: &str) -> ServiceResult<Vec<OrderPayment>> {
        Ok(self.get_payments(order_id).await?)
    }

    async fn append_items(&self, order_id: &str, items: &[OrderItem]) -> ServiceResult<()> {
        Ok(OrderRepository::append_items(self, order_id, items).await?)
    }

    async fn settle(
        &self,
        order_id: &str,
        summary: &CheckoutSummary,
        payments: &[OrderPayment],
    ) -> ServiceResult<()> {
        Ok(self.settle_order(order_id, summary, payments).await?)
    }

    async fn cancel(&self, order_id: &str) -> ServiceResult<()> {
        Ok(self.cancel_order(order_id).await?)
    }

    async fn cash_sales_total(&self, register_id: &str) -> ServiceResult<i64> {
        Ok(OrderRepository::cash_sales_total(self, register_id).await?)
    }
}

#[async_trait]
impl RegisterStore for RegisterRepository {
    async fn insert(&self, register: &CashRegister) -> ServiceResult<()> {
        Ok(self.insert_register(register).await?)
    }

    async fn find_open_by_operator(&self, operator: &str) -> ServiceResult<Option<CashRegister>> {
        Ok(RegisterRepository::find_open_by_operator(self, operator).await?)
    }

    async fn close(&self, register: &CashRegister) -> ServiceResult<()> {
        Ok(self.close_register(register).await?)
    }

    async fn insert_movement(&self, movement: &CashMovement) -> ServiceResult<()> {
        Ok(RegisterRepository::insert_movement(self, movement).await?)
    }

    async fn movements(&self, register_id: &str) -> ServiceResult<Vec<CashMovement>> {
        Ok(self.list_movements(register_id).await?)
    }
}

#[async_trait]
impl StockLedger for ProductRepository {
    async fn deduct(&self, items: &[OrderItem]) -> ServiceResult<()> {
        Ok(self.deduct_stock(items).await?)
    }
}

/// A printer that writes tickets to the log instead of paper.
///
/// Default wiring for headless and test environments.
#[derive(Debug, Clone, Default)]
pub struct LogPrinter;

#[async_trait]
impl ReceiptPrinter for LogPrinter {
    async fn print_receipt(
        &self,
        order: &Order,
        items: &[OrderItem],
        payments: &[OrderPayment],
    ) -> ServiceResult<()> {
        info!(
            order_number = %order.order_number,
            total = %order.total(),
            items = items.len(),
            payments = payments.len(),
            "RECEIPT"
        );
        Ok(())
    }

    async fn print_kitchen_ticket(&self, items: &[OrderItem]) -> ServiceResult<()> {
        for item in items {
            info!(name = %item.name_snapshot, quantity = item.quantity, "KITCHEN TICKET");
        }
        Ok(())
    }
}
