//! Unified error types surfaced by the session API.
//!
//! Wraps failures from worker coordination and the persistence gateway so
//! clients can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use economy_core::ItemId;

pub use crate::gateway::GatewayError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("session runtime requires {0} before building")]
    MissingComponent(&'static str),

    #[error("unknown catalog item {0}")]
    UnknownItem(ItemId),

    /// Raised by the local affordability pre-check and by the gateway's own
    /// re-validation during settlement; in both cases no state has changed.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds { price: u64, balance: u64 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("final flush timed out")]
    FlushTimeout,
}
