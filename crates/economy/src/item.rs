//! Catalog contracts and item-effect variants.
//!
//! The catalog itself is static reference data owned by an external
//! collaborator; this module only defines the contract the economy consumes
//! (lookup via [`Catalog`]) and the closed set of effects an item can have.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pricing;

/// Identifier of a catalog item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What owning one unit of an item does to the accrual rate.
///
/// A closed set of variants, dispatched where the rate is derived. Free-text
/// effect tags are display data and live on [`ItemDefinition::category`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    /// Adds a flat `credits_per_second` to the accrual rate per unit owned.
    FlatRateBonus { credits_per_second: f64 },
    /// Multiplies the flat-bonus subtotal by `factor` per unit owned.
    Multiplier { factor: f64 },
}

/// Static definition of a purchasable item (read-only reference data).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    pub base_cost: u64,
    pub effect: ItemEffect,
    /// Display grouping only; carries no game-logic meaning.
    pub category: String,
}

/// Lookup interface over the static item catalog.
pub trait Catalog: Send + Sync {
    fn definition(&self, id: &ItemId) -> Option<ItemDefinition>;

    fn all_definitions(&self) -> Vec<ItemDefinition>;
}

/// One row of the player-facing shop: an item, how many are owned, and what
/// the next unit costs on the price curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub item: ItemDefinition,
    pub owned: u32,
    pub next_price: u64,
}

/// Build the shop view for the given owned quantities.
///
/// Every catalog item appears exactly once, sorted by id so the view is
/// stable across calls.
pub fn shop_view(owned: &BTreeMap<ItemId, u32>, catalog: &dyn Catalog) -> Vec<ShopEntry> {
    let mut defs = catalog.all_definitions();
    defs.sort_by(|a, b| a.id.cmp(&b.id));

    defs.into_iter()
        .map(|def| {
            let quantity = owned.get(&def.id).copied().unwrap_or(0);
            ShopEntry {
                next_price: pricing::price(def.base_cost, quantity),
                owned: quantity,
                item: def,
            }
        })
        .collect()
}
