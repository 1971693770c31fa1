//! Session lifecycle: load, reconcile, run, flush.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use economy_core::{
    Catalog, ItemId, OwnedItem, PlayerId, SessionState, ShopEntry, derive_rate, item,
    offline_gain,
};
use session_runtime::{
    GatewayError, PersistenceGateway, SessionConfig, SessionError, SessionEvent, SessionHandle,
    SessionRuntime,
};

/// Errors surfaced by session start.
#[derive(Debug, Error)]
pub enum StartError {
    /// The record store has no such player. The caller must send the user
    /// back through authentication; there is no session to salvage.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error(transparent)]
    Gateway(GatewayError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What the player sees at session start.
#[derive(Clone, Debug)]
pub struct StartSummary {
    pub player: PlayerId,
    pub display_name: String,
    /// Floored balance, offline gain included.
    pub credits: u64,
    pub total_clicks: u64,
    /// Derived from owned items; the persisted rate field is not trusted.
    pub accrual_rate: f64,
    /// One-shot offline-earnings value (also published as an event).
    pub offline_earnings: u64,
    /// Every catalog item with owned quantity and next-purchase price.
    pub shop: Vec<ShopEntry>,
}

/// A running session: the runtime plus the start summary.
#[derive(Debug)]
pub struct Session {
    runtime: SessionRuntime,
    summary: StartSummary,
}

impl Session {
    pub fn handle(&self) -> SessionHandle {
        self.runtime.handle()
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.runtime.subscribe_events()
    }

    pub fn summary(&self) -> &StartSummary {
        &self.summary
    }

    /// End the session with a final best-effort flush.
    ///
    /// A failed flush is returned to the caller but is not fatal anywhere
    /// else: the loss is bounded by the autosave interval.
    pub async fn end(self) -> Result<(), SessionError> {
        self.runtime.shutdown().await
    }
}

/// Start a session for `player`.
///
/// Loads the authoritative record and owned items, derives the accrual rate
/// server-side, folds in offline gain since the last save, and spawns the
/// session runtime with its schedulers.
pub async fn start_session(
    gateway: Arc<dyn PersistenceGateway>,
    catalog: Arc<dyn Catalog>,
    player: PlayerId,
    config: SessionConfig,
) -> Result<Session, StartError> {
    let record = gateway.load_economy(&player).await.map_err(|e| match e {
        GatewayError::NotFound(p) => StartError::UnknownPlayer(p),
        other => StartError::Gateway(other),
    })?;
    let owned_items = gateway
        .load_owned_items(&player)
        .await
        .map_err(StartError::Gateway)?;

    let owned_map: BTreeMap<ItemId, u32> = owned_items
        .iter()
        .map(|entry: &OwnedItem| (entry.item.clone(), entry.quantity))
        .collect();
    let accrual_rate = derive_rate(&owned_map, catalog.as_ref());

    let earned_offline = offline_gain(record.last_save_at, Utc::now(), accrual_rate);

    let mut state = SessionState::from_record(&record, owned_items, accrual_rate);
    state.apply_offline_gain(earned_offline);

    info!(
        target: "bootstrap::session",
        player = %player,
        credits = state.credits(),
        accrual_rate,
        offline_earnings = earned_offline,
        "session starting"
    );

    let summary = StartSummary {
        player: player.clone(),
        display_name: record.display_name.clone(),
        credits: state.credits(),
        total_clicks: state.total_clicks(),
        accrual_rate,
        offline_earnings: earned_offline,
        shop: item::shop_view(state.owned(), catalog.as_ref()),
    };

    let runtime = SessionRuntime::builder()
        .player(player)
        .initial_state(state)
        .gateway(gateway)
        .catalog(catalog)
        .offline_earnings(earned_offline)
        .config(config)
        .build()?;

    Ok(Session { runtime, summary })
}
