//! # Register Session
//!
//! Threads the current till explicitly through the checkout flow instead
//! of a page-global mutable reference. One authoritative
//! `find_open_by_operator` read happens at session start and after every
//! open/close transition; nothing is cached and assumed fresh.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Register Session Flow                               │
//! │                                                                         │
//! │  resume(operator) ───► find_open_by_operator ───► current: Some/None   │
//! │         │                                                               │
//! │         ├── open_register(float)   NoRegister → Open  (+store insert)  │
//! │         ├── record_movement(...)   Open only          (+store insert)  │
//! │         ├── report()               recompute expected cash on demand   │
//! │         └── close_register(count)  Open → Closed      (+store update)  │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                     re-read find_open_by_operator (authoritative)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::collaborators::{OrderStore, RegisterStore};
use crate::error::{ServiceError, ServiceResult};
use comanda_core::{
    expected_cash_cents, CashMovement, CashRegister, CashVariance, CoreError, MovementKind,
};

/// A point-in-time view of an open till, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReport {
    pub register: CashRegister,
    pub cash_sales_cents: i64,
    pub additions_cents: i64,
    pub withdrawals_cents: i64,
    pub expected_cash_cents: i64,
    pub movements: Vec<CashMovement>,
}

/// The frozen outcome of closing a till.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterClosing {
    pub register: CashRegister,
    pub variance: CashVariance,
}

/// One operator's till session.
pub struct RegisterSession {
    registers: Arc<dyn RegisterStore>,
    orders: Arc<dyn OrderStore>,
    operator: String,
    current: Option<CashRegister>,
}

impl RegisterSession {
    /// Starts a session for an operator, reading the authoritative open
    /// register (if any) from the store.
    pub async fn resume(
        registers: Arc<dyn RegisterStore>,
        orders: Arc<dyn OrderStore>,
        operator: impl Into<String>,
    ) -> ServiceResult<Self> {
        let operator = operator.into();
        let current = registers.find_open_by_operator(&operator).await?;

        if let Some(register) = &current {
            info!(operator = %operator, register_id = %register.id, "Resumed open register");
        }

        Ok(RegisterSession {
            registers,
            orders,
            operator,
            current,
        })
    }

    /// The register this session currently tracks, if one is open.
    pub fn current(&self) -> Option<&CashRegister> {
        self.current.as_ref()
    }

    /// Opens a register for this operator.
    ///
    /// Fails fast if this session already tracks an open register; the
    /// store's unique index catches the cross-tab race the session
    /// cannot see.
    pub async fn open_register(&mut self, initial_cash_cents: i64) -> ServiceResult<&CashRegister> {
        if self.current.is_some() {
            return Err(ServiceError::RegisterAlreadyOpen(self.operator.clone()));
        }

        let register = CashRegister::open(&self.operator, initial_cash_cents)?;
        self.registers.insert(&register).await?;

        info!(
            operator = %self.operator,
            register_id = %register.id,
            initial_cash = register.initial_cash_cents,
            "Register opened"
        );

        // Authoritative re-read after the transition
        self.current = self.registers.find_open_by_operator(&self.operator).await?;
        self.current
            .as_ref()
            .ok_or_else(|| ServiceError::Core(CoreError::NoOpenRegister))
    }

    /// Records a sangria/reforço against the open register.
    pub async fn record_movement(
        &self,
        kind: MovementKind,
        amount_cents: i64,
        reason: &str,
    ) -> ServiceResult<CashMovement> {
        let register = self.current.as_ref().ok_or(CoreError::NoOpenRegister)?;

        let movement = register.movement(kind, amount_cents, reason, &self.operator)?;
        self.registers.insert_movement(&movement).await?;

        info!(
            register_id = %register.id,
            kind = ?movement.kind,
            amount = movement.amount_cents,
            reason = %movement.reason,
            "Movement recorded"
        );

        Ok(movement)
    }

    /// Builds a fresh report for the open register.
    ///
    /// Expected cash is recomputed from the stores every time: orders and
    /// movements may have changed since the last poll.
    pub async fn report(&self) -> ServiceResult<RegisterReport> {
        let register = self.current.as_ref().ok_or(CoreError::NoOpenRegister)?;

        let movements = self.registers.movements(&register.id).await?;
        let cash_sales = self.orders.cash_sales_total(&register.id).await?;

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

        Ok(RegisterReport {
            register: register.clone(),
            cash_sales_cents: cash_sales,
            additions_cents: additions,
            withdrawals_cents: withdrawals,
            expected_cash_cents: expected_cash_cents(
                register.initial_cash_cents,
                cash_sales,
                &movements,
            ),
            movements,
        })
    }

    /// Closes the open register against a manual count.
    ///
    /// Atomic from the caller's perspective: the frozen count, expected
    /// cash and difference land in one guarded store update, and the
    /// session only forgets the register once that write succeeded.
    pub async fn close_register(&mut self, counted_cash_cents: i64) -> ServiceResult<RegisterClosing> {
        let report = self.report().await?;

        let mut register = report.register;
        let variance = register.close(counted_cash_cents, report.expected_cash_cents)?;

        self.registers.close(&register).await?;

        info!(
            register_id = %register.id,
            counted = counted_cash_cents,
            expected = report.expected_cash_cents,
            difference = ?register.difference_cents,
            variance = variance.as_str(),
            "Register closed"
        );

        // Authoritative re-read after the transition
        self.current = self.registers.find_open_by_operator(&self.operator).await?;

        Ok(RegisterClosing { register, variance })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
