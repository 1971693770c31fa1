//! Persisted player-economy types shared between the session and the gateway.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// Unique identifier for a player, issued by the (external) account system.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The player economy record as persisted by the gateway.
///
/// The session treats this as a snapshot, never an alias: mutations happen on
/// [`crate::state::SessionState`] and are written back through explicit saves.
///
/// `credits` is stored as an integer; fractional accumulation exists only
/// inside a live session and is truncated at every persistence boundary.
/// `accrual_rate` is derived by the gateway from owned items; sessions
/// re-derive it from the owned-item list and never trust this field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyRecord {
    pub player: PlayerId,
    pub display_name: String,
    pub credits: u64,
    pub total_clicks: u64,
    pub accrual_rate: f64,
    pub last_save_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One owned-item entry: a catalog item the player has purchased at least
/// once, with the quantity held.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedItem {
    pub item: ItemId,
    pub quantity: u32,
}

impl OwnedItem {
    pub fn new(item: ItemId, quantity: u32) -> Self {
        Self { item, quantity }
    }
}
