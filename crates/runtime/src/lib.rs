//! Session orchestration for the idle-clicker reconciliation engine.
//!
//! This crate wires the pure economy logic, the persistence-gateway
//! abstraction, and background tasks into a cohesive runtime API. Consumers
//! build a [`SessionRuntime`] over already-reconciled state (see the
//! `session-bootstrap` crate) and interact with it through [`SessionHandle`].
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`gateway`] defines the record-store contract plus an in-memory
//!   implementation
//! - `workers` keeps the session worker, settlement protocol, and the two
//!   schedulers internal to the crate
//!
//! Concurrency model: the session worker is the sole owner of the live
//! state. Schedulers and user actions are concurrent *sources* of mutation
//! requests, serialized onto the worker's single-consumer queue; while a
//! purchase settlement is outstanding, queued mutations wait until it
//! resolves.

pub mod api;
pub mod gateway;
pub mod session;

mod workers;

pub use api::{
    PurchaseOutcome, Result, SaveReceipt, SessionError, SessionEvent, SessionHandle,
    SessionSnapshot,
};
pub use gateway::{GatewayError, GatewayOp, InMemoryGateway, PersistenceGateway};
pub use session::{SessionConfig, SessionRuntime, SessionRuntimeBuilder};
