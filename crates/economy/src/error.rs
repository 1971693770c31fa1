//! Error types raised by economy-state mutations.

use thiserror::Error;

/// Errors surfaced by [`crate::state::SessionState`] mutators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconomyError {
    /// A purchase was attempted against a balance that cannot cover it.
    /// Expected and user-correctable; the state is left untouched.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds { price: u64, balance: u64 },
}
