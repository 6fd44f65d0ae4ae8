//! Arena tunables, global feature toggles and the lifecycle state enum.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// ArenaSettings
// ---------------------------------------------------------------------------

/// Per-arena tunables. Durations are in ticks (seconds of game time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Players needed before the lobby countdown starts. At least 2.
    pub min_players: usize,

    /// Players at which the countdown is shortened to `lobby_starting_time`.
    pub max_players: usize,

    /// Countdown length once enough players are in the lobby.
    pub lobby_waiting_time: i32,

    /// Countdown length once the arena is full.
    pub lobby_starting_time: i32,

    /// Length of a match.
    pub gameplay_time: i32,

    /// Grace period between the end of a match and cleanup.
    pub ending_time: i32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 10,
            lobby_waiting_time: 60,
            lobby_starting_time: 15,
            gameplay_time: 600,
            ending_time: 10,
        }
    }
}

impl ArenaSettings {
    /// Smallest accepted `min_players`.
    pub const MIN_PLAYERS_FLOOR: usize = 2;

    /// Clamp out-of-range values so the settings are safe to use.
    ///
    /// - `min_players` raised to [`Self::MIN_PLAYERS_FLOOR`].
    /// - `max_players` raised to `min_players`.
    /// - Negative durations set to 0.
    pub fn validated(mut self) -> Self {
        if self.min_players < Self::MIN_PLAYERS_FLOOR {
            warn!(
                min_players = self.min_players,
                "min_players below {}, clamping",
                Self::MIN_PLAYERS_FLOOR
            );
            self.min_players = Self::MIN_PLAYERS_FLOOR;
        }
        if self.max_players < self.min_players {
            warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, raising"
            );
            self.max_players = self.min_players;
        }
        for (name, value) in [
            ("lobby_waiting_time", &mut self.lobby_waiting_time),
            ("lobby_starting_time", &mut self.lobby_starting_time),
            ("gameplay_time", &mut self.gameplay_time),
            ("ending_time", &mut self.ending_time),
        ] {
            if *value < 0 {
                warn!(setting = name, value = *value, "negative duration, using 0");
                *value = 0;
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Server-wide feature toggles read by every arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Mirror the lobby countdown onto each player's level indicator.
    pub level_countdown: bool,

    /// Snapshot inventories on join and restore them after a match.
    pub inventory_manager: bool,

    /// Cross-server mode: ended matches send players to the hub or to
    /// the next hand-off arena.
    pub hand_off: bool,

    /// In hand-off mode, shut the server down once a match is cleaned up.
    pub shutdown_after_match: bool,

    /// Hide players of a running match from everyone outside it.
    pub hide_players: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            level_countdown: true,
            inventory_manager: false,
            hand_off: false,
            shutdown_after_match: false,
            hide_players: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ArenaState
// ---------------------------------------------------------------------------

/// The lifecycle state of an arena.
///
/// `Inactive` is left once, on start. Everything else is a closed cycle:
///
/// ```text
/// Inactive → Restarting → WaitingForPlayers ⇄ Starting → InGame → Ending
///                 ↑                                                  │
///                 └──────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArenaState {
    Inactive,
    WaitingForPlayers,
    Starting,
    InGame,
    Ending,
    Restarting,
}

impl ArenaState {
    /// Returns `true` if players may join as participants.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers | Self::Starting)
    }

    /// Returns `true` while a match is being played.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::InGame)
    }

    /// Returns `true` if the tick logic may move from `self` to `target`.
    pub fn can_transition_to(self, target: Self) -> bool {
        use ArenaState::*;
        matches!(
            (self, target),
            (Inactive, Restarting)
                | (WaitingForPlayers, Starting)
                | (Starting, WaitingForPlayers)
                | (Starting, InGame)
                | (InGame, Ending)
                | (Ending, Restarting)
                | (Restarting, WaitingForPlayers)
        )
    }
}

impl std::fmt::Display for ArenaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "Inactive"),
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::Starting => write!(f, "Starting"),
            Self::InGame => write!(f, "InGame"),
            Self::Ending => write!(f, "Ending"),
            Self::Restarting => write!(f, "Restarting"),
        }
    }
}
