//! Background tasks internal to the session runtime.

mod schedulers;
mod session;
mod settlement;

pub(crate) use schedulers::{spawn_autosaver, spawn_passive_ticker};
pub(crate) use session::{Command, SessionWorker};
