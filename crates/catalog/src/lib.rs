//! Static item catalog for the garage-clicker economy.
//!
//! Reference data only: the catalog never changes at runtime and carries no
//! player state. [`StaticCatalog`] implements the [`Catalog`] contract over
//! an in-memory map; [`builtin`] provides the shipped item set.

use std::collections::HashMap;

use economy_core::{Catalog, ItemDefinition, ItemEffect, ItemId};

/// [`Catalog`] implementation backed by an in-memory map.
pub struct StaticCatalog {
    definitions: HashMap<ItemId, ItemDefinition>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Add an item definition, replacing any previous one with the same id.
    pub fn add_definition(&mut self, def: ItemDefinition) {
        self.definitions.insert(def.id.clone(), def);
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for StaticCatalog {
    fn definition(&self, id: &ItemId) -> Option<ItemDefinition> {
        self.definitions.get(id).cloned()
    }

    fn all_definitions(&self) -> Vec<ItemDefinition> {
        self.definitions.values().cloned().collect()
    }
}

fn flat(id: &str, name: &str, base_cost: u64, cps: f64, category: &str) -> ItemDefinition {
    ItemDefinition {
        id: ItemId::new(id),
        name: name.to_string(),
        base_cost,
        effect: ItemEffect::FlatRateBonus {
            credits_per_second: cps,
        },
        category: category.to_string(),
    }
}

/// The shipped garage item set.
///
/// Costs roughly follow the usual idle-game decade spacing so each tier stays
/// relevant for a few purchases of the previous one.
pub fn builtin() -> StaticCatalog {
    let mut catalog = StaticCatalog::new();

    catalog.add_definition(flat("pneumatic_wrench", "Pneumatic Wrench", 15, 0.1, "tool"));
    catalog.add_definition(flat("tool_chest", "Rolling Tool Chest", 100, 1.0, "tool"));
    catalog.add_definition(flat("air_compressor", "Air Compressor", 600, 5.0, "equipment"));
    catalog.add_definition(flat("car_lift", "Two-Post Car Lift", 3_500, 20.0, "equipment"));
    catalog.add_definition(flat("diagnostic_rig", "Diagnostic Rig", 15_000, 75.0, "electronics"));
    catalog.add_definition(ItemDefinition {
        id: ItemId::new("night_crew"),
        name: "Night Crew".to_string(),
        base_cost: 60_000,
        effect: ItemEffect::Multiplier { factor: 1.5 },
        category: "staff".to_string(),
    });

    catalog
}
