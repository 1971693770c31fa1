//! Cloneable façade for issuing commands to the session worker.
//!
//! [`SessionHandle`] hides the channel plumbing and offers async helpers for
//! mutating the session or subscribing to its events. All calls are
//! serialized through the worker's single-consumer queue, so no two
//! mutations ever interleave.

use tokio::sync::{broadcast, mpsc, oneshot};

use economy_core::ItemId;

use super::errors::{Result, SessionError};
use super::events::SessionEvent;
use super::types::{PurchaseOutcome, SaveReceipt, SessionSnapshot};
use crate::workers::Command;

/// Client-facing handle to interact with a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            command_tx,
            event_tx,
        }
    }

    /// One manual action: +1 credit, +1 click. Returns the floored balance.
    pub async fn click(&self) -> Result<u64> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Click { reply: reply_tx })
            .await
            .map_err(|_| SessionError::CommandChannelClosed)?;

        reply_rx.await.map_err(SessionError::ReplyChannelClosed)
    }

    /// User-initiated flush to the gateway. Unlike autosave, a failure here
    /// is surfaced to the caller (once; no retry).
    pub async fn save(&self) -> Result<SaveReceipt> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Save { reply: reply_tx })
            .await
            .map_err(|_| SessionError::CommandChannelClosed)?;

        reply_rx.await.map_err(SessionError::ReplyChannelClosed)?
    }

    /// Purchase one unit of an item through the settlement protocol.
    ///
    /// At most one settlement runs at a time; a request issued while another
    /// purchase is in flight waits in the command queue behind it.
    pub async fn purchase(&self, item: ItemId) -> Result<PurchaseOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Purchase {
                item,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::CommandChannelClosed)?;

        reply_rx.await.map_err(SessionError::ReplyChannelClosed)?
    }

    /// Query the current session economy (read-only snapshot).
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::CommandChannelClosed)?;

        reply_rx.await.map_err(SessionError::ReplyChannelClosed)
    }

    /// Subscribe to session events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Ask the worker to flush and stop. Used by the runtime's shutdown.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| SessionError::CommandChannelClosed)?;

        reply_rx.await.map_err(SessionError::ReplyChannelClosed)?
    }
}
