//! Purchase settlement: the flush → grant → refresh protocol.
//!
//! The session never debits credits locally for a purchase. It flushes its
//! latest spend-eligible balance, asks the gateway (the final authority) to
//! grant the item, then replaces its state wholesale with the refreshed
//! authoritative copy. Any step failing leaves the session state exactly as
//! it was.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use economy_core::{Catalog, ItemId, PlayerId, SessionState, derive_rate};

use crate::api::{PurchaseOutcome, Result, SessionError};
use crate::gateway::{GatewayError, PersistenceGateway};

/// Phases of the settlement protocol.
///
/// `Idle → Syncing → Granting → Refreshing → Idle` on success; any failure
/// short-circuits through `Failed` back to `Idle`. The worker's serialized
/// command loop guarantees at most one settlement is in flight per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Syncing,
    Granting,
    Refreshing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Syncing => "syncing",
            Phase::Granting => "granting",
            Phase::Refreshing => "refreshing",
        };
        write!(f, "{}", label)
    }
}

/// Run the settlement protocol for one unit of `item` at `price`.
///
/// `price` is the locally derived charge, already checked against the
/// floored balance; the gateway independently re-validates against its own
/// record during the grant step.
pub(crate) async fn settle(
    player: &PlayerId,
    item: &ItemId,
    price: u64,
    state: &mut SessionState,
    gateway: &dyn PersistenceGateway,
    catalog: &dyn Catalog,
) -> Result<PurchaseOutcome> {
    match run(player, item, price, state, gateway, catalog).await {
        Ok(outcome) => Ok(outcome),
        Err((phase, error)) => {
            warn!(
                target: "runtime::settlement",
                player = %player,
                item = %item,
                %phase,
                %error,
                "settlement failed, session state unchanged"
            );
            Err(error)
        }
    }
}

async fn run(
    player: &PlayerId,
    item: &ItemId,
    price: u64,
    state: &mut SessionState,
    gateway: &dyn PersistenceGateway,
    catalog: &dyn Catalog,
) -> std::result::Result<PurchaseOutcome, (Phase, SessionError)> {
    // Syncing: the gateway arbitrates affordability, so it must see the
    // session's latest balance before the grant, not a stale one.
    let phase = Phase::Syncing;
    debug!(target: "runtime::settlement", item = %item, %phase, credits = state.credits(), "flushing balance before grant");
    gateway
        .save_economy(player, state.credits(), state.total_clicks())
        .await
        .map_err(|e| (phase, e.into()))?;

    // Granting: the gateway decides. No local debit happens first.
    let phase = Phase::Granting;
    debug!(target: "runtime::settlement", item = %item, %phase, price, "requesting grant");
    let granted = gateway
        .grant_item(player, item)
        .await
        .map_err(|e| match e {
            GatewayError::InsufficientFunds { price, balance } => {
                (phase, SessionError::InsufficientFunds { price, balance })
            }
            other => (phase, other.into()),
        })?;

    // Refreshing: re-fetch everything and replace the session state
    // wholesale. The gateway's copy wins; nothing is merged.
    let phase = Phase::Refreshing;
    debug!(target: "runtime::settlement", item = %item, %phase, credits = granted.credits, "grant acknowledged, refetching state");
    let record = gateway
        .load_economy(player)
        .await
        .map_err(|e| (phase, e.into()))?;
    let owned_items = gateway
        .load_owned_items(player)
        .await
        .map_err(|e| (phase, e.into()))?;

    let owned_map: BTreeMap<ItemId, u32> = owned_items
        .iter()
        .map(|entry| (entry.item.clone(), entry.quantity))
        .collect();
    let accrual_rate = derive_rate(&owned_map, catalog);
    state.replace_with(&record, owned_items, accrual_rate);

    debug!(
        target: "runtime::settlement",
        item = %item,
        credits = state.credits(),
        accrual_rate,
        "settlement complete"
    );

    Ok(PurchaseOutcome {
        item: item.clone(),
        quantity: state.owned_quantity(item),
        price,
        credits: state.credits(),
        accrual_rate,
    })
}
