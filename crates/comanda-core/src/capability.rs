//! # Plan Capabilities
//!
//! The "which features does this plan unlock" switchboard, as a pure
//! lookup over tagged variants. No inheritance, no dynamic dispatch:
//! adding a plan or a feature is a compiler-checked match arm.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Subscription plan of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Basic,
    Pro,
}

/// A gated product feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Open tabs with item appends before settlement.
    TableService,
    /// Split a bill across several payment methods.
    SplitPayments,
    /// Loyalty-derived percentage discounts at checkout.
    LoyaltyDiscounts,
    /// WhatsApp order notifications.
    WhatsappAlerts,
    /// Menu synchronization with delivery marketplaces.
    CatalogSync,
}

/// Whether `plan` unlocks `feature`.
///
/// ## Example
/// ```rust
/// use comanda_core::capability::{capability_of, Feature, Plan};
///
/// assert!(capability_of(Plan::Basic, Feature::SplitPayments));
/// assert!(!capability_of(Plan::Basic, Feature::CatalogSync));
/// assert!(capability_of(Plan::Pro, Feature::CatalogSync));
/// ```
pub const fn capability_of(plan: Plan, feature: Feature) -> bool {
    match (plan, feature) {
        // Every plan can run a counter and split a bill
        (_, Feature::SplitPayments) => true,
        (_, Feature::TableService) => true,
        // Everything else is Pro
        (Plan::Pro, _) => true,
        (Plan::Basic, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_plan() {
        assert!(capability_of(Plan::Basic, Feature::SplitPayments));
        assert!(capability_of(Plan::Basic, Feature::TableService));
        assert!(!capability_of(Plan::Basic, Feature::LoyaltyDiscounts));
        assert!(!capability_of(Plan::Basic, Feature::WhatsappAlerts));
        assert!(!capability_of(Plan::Basic, Feature::CatalogSync));
    }

    #[test]
    fn test_pro_plan_unlocks_everything() {
        for feature in [
            Feature::TableService,
            Feature::SplitPayments,
            Feature::LoyaltyDiscounts,
            Feature::WhatsappAlerts,
            Feature::CatalogSync,
        ] {
            assert!(capability_of(Plan::Pro, feature));
        }
    }
}
