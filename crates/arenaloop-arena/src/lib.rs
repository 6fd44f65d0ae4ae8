//! Arena lifecycle for arena minigames.
//!
//! Each arena runs as an isolated Tokio task (actor model) that owns its
//! roster, countdown and lifecycle state, and ticks once per second of
//! game time.
//!
//! # Key types
//!
//! - [`Arena`]: the lifecycle state machine, driven by [`Arena::tick`]
//! - [`ArenaState`]: `Inactive`, then the cycle `WaitingForPlayers →
//!   Starting → InGame → Ending → Restarting`
//! - [`Hooks`]: the collaborators an arena calls into (world, notifier,
//!   displays, rewards, kits, hand-off, referee)
//! - [`ArenaHandle`] / [`ArenaRegistry`]: talk to running arena actors
//! - [`EventBus`]: lifecycle events for external listeners

mod actor;
mod arena;
mod clock;
mod config;
mod error;
mod events;
mod hooks;
mod referee;
mod registry;
mod roster;
mod spawn;
mod types;
mod user;

pub use actor::{spawn_arena, ArenaHandle};
pub use arena::{Arena, ArenaInfo, LOBBY_REMINDER_TICKS};
pub use clock::CountdownClock;
pub use config::{ArenaSettings, ArenaState, Preferences};
pub use error::{ArenaError, HookError};
pub use events::{ArenaEvent, EventBus, DEFAULT_EVENT_CAPACITY};
pub use hooks::{
    HookResult, Hooks, HubTransfer, InventoryStore, KitProvider, Message, MessageKey, Noop,
    Notifier, Presence, Referee, RewardEngine, RewardType, SignBoard, StatusDisplay, World,
};
pub use referee::StandardReferee;
pub use registry::ArenaRegistry;
pub use roster::PlayerRoster;
pub use spawn::SpawnAllocator;
pub use types::{ArenaId, GameMode, Location, PlayerId};
pub use user::{StatKind, User};
