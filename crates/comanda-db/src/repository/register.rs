//! # Cash Register Repository
//!
//! Database operations for till sessions and their movements.
//!
//! ## Guard Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              How the store protects the state machine                   │
//! │                                                                         │
//! │  One open till per operator                                            │
//! │     └── partial UNIQUE index on cash_registers(opened_by)              │
//! │         WHERE status = 'open'  →  second open gets UniqueViolation     │
//! │                                                                         │
//! │  Close exactly once                                                    │
//! │     └── UPDATE ... WHERE id = ? AND status = 'open'                    │
//! │         rows_affected = 0  →  typed NotFound, frozen row untouched     │
//! │                                                                         │
//! │  Movements only against open tills                                     │
//! │     └── movement INSERT guarded by an open-register existence check    │
//! │         in the same transaction                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::{CashMovement, CashRegister};

/// Repository for cash register database operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

const REGISTER_COLUMNS: &str = "id, opened_by, opened_at, initial_cash_cents, status, \
     closed_at, counted_cash_cents, expected_cash_cents, difference_cents";

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Inserts a freshly opened register.
    ///
    /// A concurrent open by the same operator (two tabs) trips the
    /// partial unique index and surfaces as `UniqueViolation`.
    pub async fn insert_register(&self, register: &CashRegister) -> DbResult<()> {
        debug!(id = %register.id, opened_by = %register.opened_by, "Inserting cash register");

        sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, opened_by, opened_at, initial_cash_cents, status,
                closed_at, counted_cash_cents, expected_cash_cents, difference_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&register.id)
        .bind(&register.opened_by)
        .bind(register.opened_at)
        .bind(register.initial_cash_cents)
        .bind(register.status)
        .bind(register.closed_at)
        .bind(register.counted_cash_cents)
        .bind(register.expected_cash_cents)
        .bind(register.difference_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a register by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE id = ?1",
            REGISTER_COLUMNS
        );
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// The single authoritative "is there an open till for this operator"
    /// read. Sessions call this at start and after every open/close
    /// transition; nothing caches the answer.
    pub async fn find_open_by_operator(&self, operator: &str) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE opened_by = ?1 AND status = 'open'",
            REGISTER_COLUMNS
        );
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(operator)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// Persists a close: writes the frozen count/expected/difference and
    /// flips the status, in one guarded UPDATE.
    ///
    /// ## Atomicity
    /// The caller never observes a partially closed register: either all
    /// frozen fields land with the status flip, or (if the register was
    /// already closed) nothing changes and a typed error is returned.
    pub async fn close_register(&self, register: &CashRegister) -> DbResult<()> {
        debug!(id = %register.id, difference = ?register.difference_cents, "Closing cash register");

        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET
                status = 'closed',
                closed_at = ?2,
                counted_cash_cents = ?3,
                expected_cash_cents = ?4,
                difference_cents = ?5
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&register.id)
        .bind(register.closed_at)
        .bind(register.counted_cash_cents)
        .bind(register.expected_cash_cents)
        .bind(register.difference_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash register (open)", &register.id));
        }

        Ok(())
    }

    /// Appends a movement, verifying inside the transaction that the
    /// owning register is still open.
    pub async fn insert_movement(&self, movement: &CashMovement) -> DbResult<()> {
        debug!(
            register_id = %movement.cash_register_id,
            kind = ?movement.kind,
            amount = movement.amount_cents,
            "Recording cash movement"
        );

        let mut tx = self.pool.begin().await?;

        let open: Option<String> = sqlx::query_scalar(
            "SELECT id FROM cash_registers WHERE id = ?1 AND status = 'open'",
        )
        .bind(&movement.cash_register_id)
        .fetch_optional(&mut *tx)
        .await?;

        if open.is_none() {
            return Err(DbError::not_found(
                "Cash register (open)",
                &movement.cash_register_id,
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO cash_movements (
                id, cash_register_id, kind, amount_cents,
                reason, performed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.cash_register_id)
        .bind(movement.kind)
        .bind(movement.amount_cents)
        .bind(&movement.reason)
        .bind(&movement.performed_by)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Lists all movements for a register, oldest first.
    pub async fn list_movements(&self, register_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, cash_register_id, kind, amount_cents,
                   reason, performed_by, created_at
            FROM cash_movements
            WHERE cash_register_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
