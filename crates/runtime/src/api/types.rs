//! Reply payloads for session commands.

use serde::{Deserialize, Serialize};

use economy_core::{ItemId, OwnedItem, ShopEntry};

/// Confirmation of a successful flush to the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub credits: u64,
    pub total_clicks: u64,
}

/// Result of a settled purchase, reflecting the refreshed authoritative
/// state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub item: ItemId,
    /// Owned quantity after the grant.
    pub quantity: u32,
    /// Price charged for this unit.
    pub price: u64,
    /// Floored balance after settlement.
    pub credits: u64,
    pub accrual_rate: f64,
}

/// Read-only snapshot of the live session economy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Spend-eligible (floored) balance.
    pub credits: u64,
    /// Raw fractional balance, for display.
    pub credits_raw: f64,
    pub total_clicks: u64,
    pub accrual_rate: f64,
    pub owned: Vec<OwnedItem>,
    /// Every catalog item with owned quantity and derived next price.
    pub shop: Vec<ShopEntry>,
}
