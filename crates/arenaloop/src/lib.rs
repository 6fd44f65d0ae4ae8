//! # Arenaloop
//!
//! Match-lifecycle engine for arena minigames.
//!
//! Each arena cycles through a lobby, a countdown, a timed match, an
//! ending grace period and a reset, once per tick. The host platform
//! implements the collaborator traits in [`Hooks`](prelude::Hooks)
//! (teleports, messages, displays, rewards) and the engine decides when
//! to call them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arenaloop::prelude::*;
//!
//! # async fn serve() -> Result<(), ArenaloopError> {
//! arenaloop::init_tracing();
//! let server = ArenaServer::builder()
//!     .config(ServerConfig::from_path("arenas.json")?)
//!     .hooks(Hooks::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod hub;
mod server;
mod settings;

pub use error::{ArenaloopError, ConfigError};
pub use hub::{ChannelHub, HubJoin};
pub use server::{ArenaServer, ArenaServerBuilder};
pub use settings::{ArenaDefinition, ServerConfig, TickSettings};

/// Installs a `tracing` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Does nothing
/// if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}

/// Everything needed to run arenas and implement their collaborators.
pub mod prelude {
    pub use arenaloop_arena::{
        Arena, ArenaError, ArenaEvent, ArenaHandle, ArenaId, ArenaInfo, ArenaRegistry,
        ArenaSettings, ArenaState, EventBus, GameMode, HookError, HookResult, Hooks, HubTransfer,
        InventoryStore, KitProvider, Location, Message, MessageKey, Noop, Notifier, PlayerId,
        Preferences, Presence, Referee, RewardEngine, RewardType, SignBoard, StandardReferee,
        StatKind, StatusDisplay, World,
    };
    pub use arenaloop_tick::{TickConfig, TickPolicy};

    pub use crate::{
        ArenaDefinition, ArenaServer, ArenaServerBuilder, ArenaloopError, ConfigError,
        ServerConfig, TickSettings,
    };
}
