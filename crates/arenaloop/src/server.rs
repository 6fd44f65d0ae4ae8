//! `ArenaServer` builder and server loop.
//!
//! Ties the layers together: configuration → arenas → registry. The loop
//! keeps the registry's player index in line with arena events and
//! carries out hand-off joins queued by [`ChannelHub`].

use std::sync::Arc;

use arenaloop_arena::{ArenaEvent, ArenaRegistry, EventBus, Hooks};
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::hub::{ChannelHub, HubJoin};
use crate::{ArenaloopError, ServerConfig};

/// Builder for configuring and starting an arena server.
///
/// # Example
///
/// ```rust,ignore
/// use arenaloop::prelude::*;
///
/// let server = ArenaServer::builder()
///     .config(ServerConfig::from_path("arenas.json")?)
///     .hooks(my_hooks)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ArenaServerBuilder {
    config: ServerConfig,
    hooks: Hooks,
}

impl ArenaServerBuilder {
    /// Creates a builder with an empty configuration and no-op hooks.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            hooks: Hooks::default(),
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the collaborators every arena calls into.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Registers an actor per configured arena. Arenas are started by
    /// [`ArenaServer::run`].
    pub async fn build(self) -> Result<ArenaServer, ArenaloopError> {
        let config = self.config;
        config.check()?;

        let events = EventBus::new(config.event_capacity);
        let (hub, hub_requests) = ChannelHub::new(config.arena_ids(), self.hooks.hub.clone());
        let hooks = Hooks {
            hub: Arc::new(hub),
            ..self.hooks
        };

        let mut registry = ArenaRegistry::new(config.tick.to_tick_config());
        for definition in &config.arenas {
            let arena = definition.build(&config.preferences, hooks.clone(), &events);
            registry.register(arena)?;
        }
        tracing::info!(arenas = registry.arena_count(), "arena server built");

        Ok(ArenaServer {
            registry: Arc::new(Mutex::new(registry)),
            event_rx: events.subscribe(),
            events,
            hub_requests,
        })
    }
}

impl Default for ArenaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A set of arenas plus the loop that serves them.
///
/// Call [`run()`](Self::run) to start every arena.
pub struct ArenaServer {
    registry: Arc<Mutex<ArenaRegistry>>,
    events: EventBus,
    event_rx: broadcast::Receiver<ArenaEvent>,
    hub_requests: mpsc::UnboundedReceiver<HubJoin>,
}

impl ArenaServer {
    pub fn builder() -> ArenaServerBuilder {
        ArenaServerBuilder::new()
    }

    /// Shared registry, for joins, leaves and operator commands.
    pub fn registry(&self) -> Arc<Mutex<ArenaRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArenaEvent> {
        self.events.subscribe()
    }

    /// Starts every arena and serves events and hand-offs.
    ///
    /// Events are handled before hand-off joins, so a finished match has
    /// released its players from the index by the time they rejoin.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ArenaloopError> {
        let started = self.registry.lock().await.start_all().await;
        tracing::info!(arenas = started, "arena server running");

        loop {
            tokio::select! {
                biased;

                event = self.event_rx.recv() => match event {
                    Ok(event) => self.registry.lock().await.apply_event(&event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "server loop lagged behind arena events");
                        self.registry.lock().await.reconcile().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                Some(HubJoin { player, arena }) = self.hub_requests.recv() => {
                    let mut registry = self.registry.lock().await;
                    if let Err(error) = registry.join(player, &arena).await {
                        tracing::debug!(%player, arena_id = %arena, %error, "hand-off join refused");
                    }
                }
            }
        }

        Ok(())
    }
}
