//! # Cart Ledger
//!
//! The in-memory ordered collection of line items for one checkout session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Ledger Operations                             │
//! │                                                                         │
//! │  Frontend Action          Operation               Ledger Change         │
//! │  ───────────────          ─────────               ─────────────         │
//! │                                                                         │
//! │  Tap product ────────────► add_item() ──────────► insert or +qty        │
//! │                                                                         │
//! │  Tap +/− stepper ────────► adjust_quantity() ───► qty ± delta (floored) │
//! │                                                                         │
//! │  Tap remove ─────────────► remove_item() ───────► line removed          │
//! │                                                                         │
//! │  Order emitted ──────────► clear() ─────────────► ledger emptied        │
//! │                                                                         │
//! │  All mutations are synchronous and immediately observable; the cart    │
//! │  is transient UI state, never persisted directly.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantity Floors
//! The counter screen decrements to zero and drops the line; the
//! table-service screen floors at one so a seated table never loses its
//! last item by accident. Both behaviors are real, so the floor is an
//! explicit configuration of the ledger rather than a hard-coded choice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Quantity Floor
// =============================================================================

/// Lower clamp applied when a quantity is decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum QuantityFloor {
    /// Quantity may reach 0; the line is removed when it does (counter flow).
    RemoveAtZero,
    /// Quantity never drops below 1; the line survives (table-service flow).
    KeepAtOne,
}

impl Default for QuantityFloor {
    fn default() -> Self {
        QuantityFloor::RemoveAtZero
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// - `product_id`: Reference to the product (for stock deduction later)
/// - name and unit price are frozen copies taken when the line was added,
///   so a menu edit mid-service cannot reprice an open cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    /// Product ID (UUID)
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Price in cents at time of adding (frozen)
    pub unit_price_cents: i64,

    /// Quantity in cart
    pub quantity: i64,

    /// When this line was added to the cart
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new cart line from a product and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Calculates the line total (unit price × quantity).
    ///
    /// Computed, never stored, so `line_total == quantity * unit_price`
    /// holds at all times by construction.
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart ledger.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increments)
/// - Every line has quantity > 0
/// - Maximum unique lines: 100
/// - Maximum quantity per line: 999
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in the cart, in insertion order.
    pub items: Vec<CartItem>,

    /// Decrement clamp behavior for this cart.
    pub floor: QuantityFloor,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart with the given quantity floor.
    pub fn new(floor: QuantityFloor) -> Self {
        Cart {
            items: Vec::new(),
            floor,
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// ## Behavior
    /// - If product already in cart: increases quantity
    /// - If product not in cart: appends a new line
    ///
    /// Insert-or-increment is idempotent in shape: there is no error path
    /// for "already present".
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Adjusts a line's quantity by a signed delta, clamped at the
    /// configured floor.
    ///
    /// ## Behavior
    /// - `RemoveAtZero`: result clamps at 0 and the line is removed there
    /// - `KeepAtOne`: result clamps at 1 and the line always survives
    /// - Result above `MAX_ITEM_QUANTITY` is rejected
    pub fn adjust_quantity(&mut self, product_id: &str, delta: i64) -> CoreResult<()> {
        let idx = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        let floor_qty = match self.floor {
            QuantityFloor::RemoveAtZero => 0,
            QuantityFloor::KeepAtOne => 1,
        };

        let new_qty = (self.items[idx].quantity + delta).max(floor_qty);
        if new_qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if new_qty == 0 {
            // Only reachable under RemoveAtZero
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = new_qty;
        }

        Ok(())
    }

    /// Removes a line from the cart by product ID, unconditionally.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Returns the number of unique lines in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Calculates the subtotal. Pure, O(n), no side effects.
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_cents()).sum()
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents())
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(QuantityFloor::RemoveAtZero)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: None,
            price_cents,
            category: None,
            track_stock: false,
            current_stock: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::default();
        let burger = test_product("1", 2500);

        cart.add_item(&burger, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_cents(), 5000);
    }

    #[test]
    fn test_add_same_product_increments() {
        let mut cart = Cart::default();
        let burger = test_product("1", 2500);

        cart.add_item(&burger, 2).unwrap();
        cart.add_item(&burger, 3).unwrap();

        assert_eq!(cart.item_count(), 1); // Still one unique line
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::default();
        let burger = test_product("1", 2500);

        assert!(cart.add_item(&burger, 0).is_err());
        assert!(cart.add_item(&burger, -1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adjust_quantity_remove_at_zero() {
        let mut cart = Cart::new(QuantityFloor::RemoveAtZero);
        let soda = test_product("2", 800);

        cart.add_item(&soda, 1).unwrap();
        cart.adjust_quantity("2", -1).unwrap();

        // Quantity hit zero: line is gone
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adjust_quantity_keep_at_one() {
        let mut cart = Cart::new(QuantityFloor::KeepAtOne);
        let soda = test_product("2", 800);

        cart.add_item(&soda, 1).unwrap();
        cart.adjust_quantity("2", -5).unwrap();

        // Floor at one: line survives
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[test]
    fn test_adjust_quantity_unknown_product() {
        let mut cart = Cart::default();
        let err = cart.adjust_quantity("missing", 1).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotInCart(_)));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::default();
        let burger = test_product("1", 2500);

        cart.add_item(&burger, 2).unwrap();
        cart.remove_item("1").unwrap();

        assert!(cart.is_empty());
        assert!(cart.remove_item("1").is_err());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::default();
        let burger = test_product("1", 2500);

        cart.add_item(&burger, 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }

    /// The ledger invariant: for any op sequence, the subtotal equals the
    /// sum of quantity × unit price over the surviving lines.
    #[test]
    fn test_subtotal_invariant_under_op_sequence() {
        let mut cart = Cart::default();
        let burger = test_product("1", 2500);
        let soda = test_product("2", 800);
        let fries = test_product("3", 1200);

        cart.add_item(&burger, 2).unwrap();
        cart.add_item(&soda, 1).unwrap();
        cart.add_item(&fries, 3).unwrap();
        cart.adjust_quantity("3", -2).unwrap();
        cart.remove_item("2").unwrap();
        cart.add_item(&soda, 2).unwrap();

        let expected: i64 = cart
            .items
            .iter()
            .map(|i| i.quantity * i.unit_price_cents)
            .sum();
        assert_eq!(cart.subtotal_cents(), expected);
        assert_eq!(cart.subtotal_cents(), 2 * 2500 + 1 * 1200 + 2 * 800);
    }
}
