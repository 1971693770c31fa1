//! Persistence-gateway contract consumed by the session runtime.
//!
//! The gateway is the record store of the player economy and the final
//! authority on purchases. The session holds a working copy of its data and
//! reconciles through the operations below; it never bypasses them.

use async_trait::async_trait;
use thiserror::Error;

use economy_core::{EconomyRecord, ItemId, OwnedItem, PlayerId};

mod memory;

pub use memory::{GatewayOp, InMemoryGateway};

/// Errors surfaced by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The player id is unknown to the record store. Fatal to session start;
    /// the caller must send the user back through authentication.
    #[error("player {0} not found")]
    NotFound(PlayerId),

    /// The store refused a grant because the recorded balance cannot cover
    /// the current price. Expected and user-correctable.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds { price: u64, balance: u64 },

    /// Network or store hiccup. Periodic callers absorb and retry on the
    /// next cycle; user-initiated callers surface it once.
    #[error("transient gateway failure: {0}")]
    Transient(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Record-store operations the reconciliation core depends on.
///
/// `save_economy` deliberately takes credits and clicks only: the accrual
/// rate is derived by the store from owned items, never dictated by a client.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Load the persisted economy record for a player.
    async fn load_economy(&self, player: &PlayerId) -> Result<EconomyRecord>;

    /// Load the player's owned-item list.
    async fn load_owned_items(&self, player: &PlayerId) -> Result<Vec<OwnedItem>>;

    /// Persist the session's floored balance and lifetime click count.
    async fn save_economy(
        &self,
        player: &PlayerId,
        credits: u64,
        total_clicks: u64,
    ) -> Result<()>;

    /// Grant one unit of an item, debiting its current price.
    ///
    /// The store re-validates affordability against its own record and
    /// returns the updated record on success.
    async fn grant_item(&self, player: &PlayerId, item: &ItemId) -> Result<EconomyRecord>;
}
