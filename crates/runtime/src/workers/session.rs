//! Session worker that owns the live [`SessionState`].
//!
//! Receives commands from [`SessionHandle`](crate::api::SessionHandle) and
//! the schedulers over a single-consumer queue, applies them one at a time,
//! and publishes events to subscribers. Because commands are processed
//! sequentially, no mutation can observe a partially-applied sibling and a
//! purchase settlement holds exclusive access to the state for its whole
//! flush → grant → refresh span.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use economy_core::{Catalog, ItemId, PlayerId, SessionState, item, pricing};

use crate::api::{PurchaseOutcome, Result, SaveReceipt, SessionError, SessionEvent, SessionSnapshot};
use crate::gateway::PersistenceGateway;
use crate::workers::settlement;

/// Commands that can be sent to the session worker.
pub(crate) enum Command {
    /// One manual action. Replies with the new floored balance.
    Click { reply: oneshot::Sender<u64> },

    /// One accrual-rate's worth of credits. Fired by the passive ticker;
    /// no reply, the scheduler does not wait.
    PassiveTick,

    /// Periodic flush. Failures are absorbed and logged, never surfaced.
    Autosave,

    /// User-initiated flush. Failures are surfaced to the caller once.
    Save {
        reply: oneshot::Sender<Result<SaveReceipt>>,
    },

    /// Run the purchase-settlement protocol for one unit of an item.
    Purchase {
        item: ItemId,
        reply: oneshot::Sender<Result<PurchaseOutcome>>,
    },

    /// Query the current economy (read-only).
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },

    /// Final best-effort flush, then stop the worker.
    Shutdown { reply: oneshot::Sender<Result<()>> },
}

/// Background task that owns one player's session economy.
pub(crate) struct SessionWorker {
    player: PlayerId,
    state: SessionState,
    gateway: Arc<dyn PersistenceGateway>,
    catalog: Arc<dyn Catalog>,
    command_rx: mpsc::Receiver<Command>,
    event_tx: broadcast::Sender<SessionEvent>,
    offline_earnings: u64,
    flush_timeout: Duration,
}

impl SessionWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        player: PlayerId,
        state: SessionState,
        gateway: Arc<dyn PersistenceGateway>,
        catalog: Arc<dyn Catalog>,
        command_rx: mpsc::Receiver<Command>,
        event_tx: broadcast::Sender<SessionEvent>,
        offline_earnings: u64,
        flush_timeout: Duration,
    ) -> Self {
        Self {
            player,
            state,
            gateway,
            catalog,
            command_rx,
            event_tx,
            offline_earnings,
            flush_timeout,
        }
    }

    /// Main worker loop.
    pub(crate) async fn run(mut self) {
        info!(
            target: "runtime::worker",
            player = %self.player,
            credits = self.state.credits(),
            accrual_rate = self.state.accrual_rate(),
            "session worker started"
        );

        // One-shot offline-earnings notification, the player's audit channel
        // for accrual that happened while disconnected.
        if self.offline_earnings > 0 {
            self.publish(SessionEvent::OfflineEarnings {
                credits: self.offline_earnings,
            });
        }

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if self.handle_command(cmd).await {
                        break;
                    }
                }
                else => break,
            }
        }

        info!(target: "runtime::worker", player = %self.player, "session worker stopped");
    }

    /// Returns `true` when the worker should stop.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Click { reply } => {
                self.state.apply_click();
                if reply.send(self.state.credits()).is_err() {
                    debug!(target: "runtime::worker", "click reply channel closed (caller dropped)");
                }
            }
            Command::PassiveTick => {
                self.state.apply_passive_tick();
            }
            Command::Autosave => match self.flush().await {
                Ok(receipt) => {
                    debug!(
                        target: "runtime::worker",
                        credits = receipt.credits,
                        total_clicks = receipt.total_clicks,
                        "autosave complete"
                    );
                    self.publish(SessionEvent::Saved {
                        credits: receipt.credits,
                        total_clicks: receipt.total_clicks,
                    });
                }
                Err(error) => {
                    // Absorbed: the next cycle or the session-end flush will
                    // carry further-advanced state.
                    warn!(target: "runtime::worker", %error, "autosave failed, will retry next cycle");
                }
            },
            Command::Save { reply } => {
                let result = self.flush().await;
                if let Ok(receipt) = &result {
                    self.publish(SessionEvent::Saved {
                        credits: receipt.credits,
                        total_clicks: receipt.total_clicks,
                    });
                }
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "save reply channel closed (caller dropped)");
                }
            }
            Command::Purchase { item, reply } => {
                let result = self.handle_purchase(&item).await;
                match &result {
                    Ok(outcome) => self.publish(SessionEvent::PurchaseSettled {
                        item: outcome.item.clone(),
                        quantity: outcome.quantity,
                        price: outcome.price,
                        credits: outcome.credits,
                    }),
                    Err(error) => self.publish(SessionEvent::PurchaseFailed {
                        item: item.clone(),
                        reason: error.to_string(),
                    }),
                }
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "purchase reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.snapshot()).is_err() {
                    debug!(target: "runtime::worker", "snapshot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => {
                let result = self.final_flush().await;
                if let Err(error) = &result {
                    // Bounded loss: everything since the last successful
                    // autosave.
                    warn!(target: "runtime::worker", %error, "session-end flush failed");
                }
                let _ = reply.send(result);
                return true;
            }
        }
        false
    }

    /// Push the floored balance and click count to the gateway.
    async fn flush(&self) -> Result<SaveReceipt> {
        let credits = self.state.credits();
        let total_clicks = self.state.total_clicks();
        self.gateway
            .save_economy(&self.player, credits, total_clicks)
            .await?;
        Ok(SaveReceipt {
            credits,
            total_clicks,
        })
    }

    /// Session-end flush, best effort under a short timeout.
    async fn final_flush(&self) -> Result<()> {
        match tokio::time::timeout(self.flush_timeout, self.flush()).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(SessionError::FlushTimeout),
        }
    }

    async fn handle_purchase(&mut self, item: &ItemId) -> Result<PurchaseOutcome> {
        let def = self
            .catalog
            .definition(item)
            .ok_or_else(|| SessionError::UnknownItem(item.clone()))?;

        // Local affordability pre-check against the latest balance; a short
        // balance never reaches the gateway.
        let price = pricing::price(def.base_cost, self.state.owned_quantity(item));
        let balance = self.state.credits();
        if balance < price {
            return Err(SessionError::InsufficientFunds { price, balance });
        }

        settlement::settle(
            &self.player,
            item,
            price,
            &mut self.state,
            self.gateway.as_ref(),
            self.catalog.as_ref(),
        )
        .await
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            credits: self.state.credits(),
            credits_raw: self.state.credits_raw(),
            total_clicks: self.state.total_clicks(),
            accrual_rate: self.state.accrual_rate(),
            owned: self.state.owned_entries(),
            shop: item::shop_view(self.state.owned(), self.catalog.as_ref()),
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is normal, not an error.
        let _ = self.event_tx.send(event);
    }
}
