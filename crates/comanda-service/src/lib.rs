//! # comanda-service: Orchestration Layer for Comanda POS
//!
//! Wires the pure checkout/till core to its collaborators.
//!
//! ## Module Organization
//! ```text
//! comanda_service/
//! ├── lib.rs           ◄─── You are here (tracing init, store profile)
//! ├── collaborators.rs ◄─── Trait seams (order store, stock, printer)
//! ├── adapters.rs      ◄─── comanda-db implementations of the seams
//! ├── emission.rs      ◄─── Order emission + table-service tabs
//! ├── session.rs       ◄─── Register session lifecycle
//! ├── events.rs        ◄─── Order event broadcasting
//! └── error.rs         ◄─── ServiceError + frontend error codes
//! ```
//!
//! ## Typical Wiring
//! ```rust,ignore
//! use std::sync::Arc;
//! use comanda_db::{Database, DbConfig};
//! use comanda_service::{adapters::LogPrinter, OrderEmitter, RegisterSession};
//!
//! comanda_service::init_tracing();
//!
//! let db = Database::new(DbConfig::new("./comanda.db")).await?;
//! let emitter = OrderEmitter::new(
//!     Arc::new(db.orders()),
//!     Arc::new(db.products()),
//!     Arc::new(LogPrinter),
//! );
//! let mut session = RegisterSession::resume(
//!     Arc::new(db.registers()),
//!     Arc::new(db.orders()),
//!     "Maria",
//! ).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapters;
pub mod collaborators;
pub mod emission;
pub mod error;
pub mod events;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use emission::{EmissionContext, OrderEmitter};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use events::{OrderEvent, OrderEvents};
pub use session::{RegisterClosing, RegisterReport, RegisterSession};

use comanda_core::capability::{capability_of, Feature, Plan};
use comanda_core::{Cart, QuantityFloor, Rate};
use tracing_subscriber::EnvFilter;

/// Initializes tracing with an env-filter.
///
/// Default level is INFO; override with `RUST_LOG`
/// (e.g. `RUST_LOG=comanda_db=debug`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

// =============================================================================
// Store Profile
// =============================================================================

/// Per-store configuration threaded through the service layer.
#[derive(Debug, Clone)]
pub struct StoreProfile {
    /// Name printed on receipts.
    pub store_name: String,

    /// Subscription plan (gates optional features).
    pub plan: Plan,

    /// House service charge applied by default (1000 bps = 10%).
    pub default_service_charge: Rate,

    /// Quantity floor for carts created by this store's screens.
    pub quantity_floor: QuantityFloor,
}

impl StoreProfile {
    /// Creates a fresh cart configured for this store.
    pub fn new_cart(&self) -> Cart {
        Cart::new(self.quantity_floor)
    }

    /// Whether this store's plan unlocks a feature.
    pub fn has_feature(&self, feature: Feature) -> bool {
        capability_of(self.plan, feature)
    }
}

impl Default for StoreProfile {
    fn default() -> Self {
        StoreProfile {
            store_name: "Comanda".to_string(),
            plan: Plan::Basic,
            default_service_charge: Rate::from_bps(1000),
            quantity_floor: QuantityFloor::RemoveAtZero,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_profile_defaults() {
        let profile = StoreProfile::default();
        assert_eq!(profile.default_service_charge.bps(), 1000);
        assert!(profile.has_feature(Feature::SplitPayments));
        assert!(!profile.has_feature(Feature::CatalogSync));

        let cart = profile.new_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.floor, QuantityFloor::RemoveAtZero);
    }

    #[test]
    fn test_pro_profile_unlocks_catalog_sync() {
        let profile = StoreProfile {
            plan: Plan::Pro,
            ..Default::default()
        };
        assert!(profile.has_feature(Feature::CatalogSync));
    }
}
