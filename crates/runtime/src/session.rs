//! High-level session runtime orchestrator.
//!
//! The runtime owns the session worker and its schedulers, wires up the
//! command/event channels, and exposes a builder-based API for starting a
//! session over already-reconciled state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use economy_core::{Catalog, PlayerId, SessionState};

use crate::api::{Result, SessionError, SessionEvent, SessionHandle};
use crate::gateway::PersistenceGateway;
use crate::workers::{SessionWorker, spawn_autosaver, spawn_passive_ticker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the passive-accrual ticker.
    pub passive_tick_period: Duration,
    /// Period of the autosave timer.
    pub autosave_period: Duration,
    /// Budget for the session-end flush.
    pub final_flush_timeout: Duration,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            passive_tick_period: Duration::from_secs(1),
            autosave_period: Duration::from_secs(120),
            final_flush_timeout: Duration::from_secs(5),
            command_buffer_size: 32,
            event_buffer_size: 64,
        }
    }
}

/// Main runtime for one connected player's session.
///
/// Owns the worker and scheduler tasks; [`SessionHandle`] provides a
/// cloneable façade for clients.
#[derive(Debug)]
pub struct SessionRuntime {
    handle: SessionHandle,
    worker: JoinHandle<()>,
    schedulers: Vec<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Create a new session runtime builder.
    pub fn builder() -> SessionRuntimeBuilder {
        SessionRuntimeBuilder::new()
    }

    /// Get a cloneable handle to this session.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Subscribe to session events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.handle.subscribe_events()
    }

    /// End the session: stop the schedulers, run the final best-effort
    /// flush, and wait for the worker to finish.
    ///
    /// Returns the flush result; on failure the loss is bounded by the
    /// autosave interval.
    pub async fn shutdown(self) -> Result<()> {
        for scheduler in &self.schedulers {
            scheduler.abort();
        }

        let flush = self.handle.shutdown().await;

        self.worker.await.map_err(SessionError::WorkerJoin)?;
        for scheduler in self.schedulers {
            // Aborted tasks report cancellation; that is the expected path.
            let _ = scheduler.await;
        }

        flush
    }
}

/// Builder for [`SessionRuntime`].
pub struct SessionRuntimeBuilder {
    config: SessionConfig,
    player: Option<PlayerId>,
    state: Option<SessionState>,
    gateway: Option<Arc<dyn PersistenceGateway>>,
    catalog: Option<Arc<dyn Catalog>>,
    offline_earnings: u64,
}

impl SessionRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            player: None,
            state: None,
            gateway: None,
            catalog: None,
            offline_earnings: 0,
        }
    }

    /// Override runtime configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the player this session belongs to.
    pub fn player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Provide the initial session state (offline gain already folded in).
    pub fn initial_state(mut self, state: SessionState) -> Self {
        self.state = Some(state);
        self
    }

    /// Set the required persistence gateway.
    pub fn gateway(mut self, gateway: Arc<dyn PersistenceGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the required item catalog.
    pub fn catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Offline gain credited at start; published once as
    /// [`SessionEvent::OfflineEarnings`] when positive.
    pub fn offline_earnings(mut self, credits: u64) -> Self {
        self.offline_earnings = credits;
        self
    }

    /// Build the runtime and spawn its tasks.
    pub fn build(self) -> Result<SessionRuntime> {
        let player = self
            .player
            .ok_or(SessionError::MissingComponent("a player id"))?;
        let state = self
            .state
            .ok_or(SessionError::MissingComponent("an initial state"))?;
        let gateway = self
            .gateway
            .ok_or(SessionError::MissingComponent("a persistence gateway"))?;
        let catalog = self
            .catalog
            .ok_or(SessionError::MissingComponent("an item catalog"))?;

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let (event_tx, _event_rx) = broadcast::channel(self.config.event_buffer_size);

        let handle = SessionHandle::new(command_tx.clone(), event_tx.clone());

        let worker = SessionWorker::new(
            player,
            state,
            gateway,
            catalog,
            command_rx,
            event_tx,
            self.offline_earnings,
            self.config.final_flush_timeout,
        );
        let worker_handle = tokio::spawn(worker.run());

        let schedulers = vec![
            spawn_passive_ticker(command_tx.clone(), self.config.passive_tick_period),
            spawn_autosaver(command_tx, self.config.autosave_period),
        ];

        Ok(SessionRuntime {
            handle,
            worker: worker_handle,
            schedulers,
        })
    }
}
