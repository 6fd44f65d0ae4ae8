//! Server configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "preferences": { "hand_off": false },
//!   "tick": { "interval_ms": 1000 },
//!   "arenas": [
//!     {
//!       "id": "pirates",
//!       "map_name": "Pirates",
//!       "settings": { "min_players": 2, "max_players": 8 },
//!       "spawn_points": [{ "world": "pirates", "x": 0.5, "y": 64.0, "z": 0.5 }],
//!       "lobby": { "world": "lobby", "x": 0.0, "y": 70.0, "z": 0.0 }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use arenaloop_arena::{
    Arena, ArenaId, ArenaSettings, EventBus, Hooks, Location, Preferences, DEFAULT_EVENT_CAPACITY,
};
use arenaloop_tick::{TickConfig, TickPolicy};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Everything needed to bring up a set of arenas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Feature toggles shared by every arena.
    pub preferences: Preferences,
    pub tick: TickSettings,
    /// Buffer of the lifecycle event channel.
    pub event_capacity: usize,
    pub arenas: Vec<ArenaDefinition>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            preferences: Preferences::default(),
            tick: TickSettings::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            arenas: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parses and checks a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Reads, parses and checks a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Rejects configurations no server could run.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.arenas.is_empty() {
            return Err(ConfigError::Invalid("no arenas configured".into()));
        }
        let mut seen = HashSet::new();
        for arena in &self.arenas {
            if !seen.insert(&arena.id) {
                return Err(ConfigError::Invalid(format!(
                    "arena id {} is used twice",
                    arena.id
                )));
            }
        }
        Ok(())
    }

    pub fn arena_ids(&self) -> Vec<ArenaId> {
        self.arenas.iter().map(|a| a.id.clone()).collect()
    }
}

/// Tick cadence as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickSettings {
    pub interval_ms: u64,
    /// Replay up to this many missed ticks after a stall. Missed ticks
    /// are skipped when unset.
    pub catch_up: Option<u32>,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            catch_up: None,
        }
    }
}

impl TickSettings {
    pub fn to_tick_config(&self) -> TickConfig {
        let policy = match self.catch_up {
            Some(max_catchup) => TickPolicy::CatchUp { max_catchup },
            None => TickPolicy::Skip,
        };
        TickConfig {
            policy,
            ..TickConfig::every(Duration::from_millis(self.interval_ms))
        }
    }
}

/// One arena as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaDefinition {
    pub id: ArenaId,
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub settings: ArenaSettings,
    #[serde(default)]
    pub spawn_points: Vec<Location>,
    #[serde(default)]
    pub lobby: Option<Location>,
    #[serde(default)]
    pub end: Option<Location>,
}

impl ArenaDefinition {
    /// Builds the `Inactive` arena this definition describes.
    pub fn build(&self, preferences: &Preferences, hooks: Hooks, events: &EventBus) -> Arena {
        let mut arena = Arena::new(self.id.clone(), self.settings.clone(), hooks, events.clone())
            .with_map_name(self.map_name.clone())
            .with_preferences(preferences.clone())
            .with_spawn_points(self.spawn_points.clone());
        if let Some(lobby) = &self.lobby {
            arena = arena.with_lobby(lobby.clone());
        }
        if let Some(end) = &self.end {
            arena = arena.with_end(end.clone());
        }
        arena
    }
}
