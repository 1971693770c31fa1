//! Session start and end workflow.
//!
//! Reusable by any front-end: given a player id (authentication is the
//! caller's concern), [`start_session`] loads the persisted economy,
//! reconciles offline time, derives the accrual rate from owned items, and
//! spins up the session runtime. [`Session::end`] runs the final
//! best-effort flush.

mod session;

pub use session::{Session, StartError, StartSummary, start_session};
