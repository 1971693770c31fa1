//! Session events broadcast to subscribed clients.

use serde::{Deserialize, Serialize};

use economy_core::ItemId;

/// Events published over the session's broadcast channel.
///
/// `OfflineEarnings` is published exactly once, when the worker starts, and
/// only when the gain was positive. It is the player's audit channel for
/// offline accrual, not a UI nicety.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Credits earned while disconnected, folded in at session start.
    OfflineEarnings { credits: u64 },

    /// A flush to the gateway succeeded (manual save or autosave).
    Saved { credits: u64, total_clicks: u64 },

    /// A purchase settled: the gateway granted the item and the session now
    /// mirrors the authoritative record.
    PurchaseSettled {
        item: ItemId,
        quantity: u32,
        price: u64,
        credits: u64,
    },

    /// A purchase failed; no state changed.
    PurchaseFailed { item: ItemId, reason: String },
}
