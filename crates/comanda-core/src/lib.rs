//! # comanda-core: Pure Business Logic for Comanda POS
//!
//! This crate is the **heart** of Comanda POS. It contains all checkout and
//! till logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Comanda POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        Frontend (browser)                       │   │
//! │  │    Menu UI ──► Cart UI ──► Payment UI ──► Till UI              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    comanda-service                              │   │
//! │  │    order emission, register sessions, order events              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌───────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ │   │
//! │  │   │ money  │ │ cart  │ │ checkout │ │ register │ │validation│ │   │
//! │  │   │ Money  │ │ Cart  │ │ Payments │ │   Till   │ │  rules   │ │   │
//! │  │   │ Rate   │ │ Items │ │ Totals   │ │ Variance │ │  checks  │ │   │
//! │  │   └────────┘ └───────┘ └──────────┘ └──────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    comanda-db (SQLite store)                    │   │
//! │  │        orders, payments, cash registers, movements, stock       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, CashRegister, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The cart ledger (insert-or-increment, quantity floors)
//! - [`checkout`] - Checkout calculator (adjustments, split payments, change)
//! - [`register`] - Cash register state machine and till reconciliation
//! - [`capability`] - Plan feature switchboard
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod capability;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod register;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use comanda_core::Money` instead of
// `use comanda_core::money::Money`

pub use cart::{Cart, CartItem, QuantityFloor};
pub use checkout::{ChargeAdjustments, Checkout, CheckoutSummary, Discount};
pub use error::{CoreError, ValidationError};
pub use money::{Money, Rate};
pub use register::{expected_cash_cents, CashVariance};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum unique items allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable ticket sizes.
/// Can be made configurable per-store in future versions.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// Configurable per-store in future versions.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Payment completion tolerance, in cents.
///
/// A checkout counts as fully paid when the recorded payments reach the
/// final total minus this tolerance. One cent absorbs rounding residue from
/// percentage-based charges without ever letting a whole centavo go missing.
pub const PAYMENT_TOLERANCE_CENTS: i64 = 1;
