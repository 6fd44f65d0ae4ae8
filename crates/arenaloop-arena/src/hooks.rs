//! Contracts for the collaborators an arena calls into.
//!
//! The arena never renders text, stores statistics or touches the game
//! world itself. It calls these traits, which the embedding server
//! implements. Every method has a no-op default so an implementation
//! only overrides what it cares about.
//!
//! Per-player side effects return [`HookResult`]. A failure is logged by
//! the arena and processing continues with the next step and the next
//! player.

use std::sync::Arc;

use crate::{Arena, ArenaId, ArenaInfo, GameMode, HookError, Location, PlayerId, StandardReferee};

/// Outcome of a single side effect on one player.
pub type HookResult = Result<(), HookError>;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Keys of the user-facing messages the arena emits. Resolving them to
/// localized text is the notifier's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Lobby reminder while below the minimum. Args: minimum players.
    WaitingForPlayers,
    /// Minimum reached, countdown begins.
    EnoughPlayersToStart,
    /// Countdown aborted. Args: minimum players.
    MinimumPlayersRequired,
    /// Countdown tick. Args: seconds.
    StartingIn,
    /// Sent to each participant when the match begins.
    GameStarted,
    /// Title shown when time is running out. Args: seconds.
    SecondsLeftTitle,
    /// Subtitle paired with `SecondsLeftTitle`. Args: seconds.
    SecondsLeftSubtitle,
    /// End-of-match title for the winner.
    VictoryTitle,
    /// End-of-match title for everyone else.
    DefeatTitle,
    /// End-of-match subtitle. Args: winner, winner's score.
    WinnerSubtitle,
}

/// A message key plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub key: MessageKey,
    pub args: Vec<String>,
}

impl Message {
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Tells whether a player is still connected.
pub trait Presence: Send + Sync {
    fn is_online(&self, _player: PlayerId) -> bool {
        true
    }
}

/// Delivers messages and titles to players.
pub trait Notifier: Send + Sync {
    fn send_message(&self, _player: PlayerId, _message: &Message) {}

    fn send_title(&self, _player: PlayerId, _title: &Message, _subtitle: &Message) {}
}

/// Scoreboards and status bars.
pub trait StatusDisplay: Send + Sync {
    /// Redraw the arena's status; called on every state change.
    fn refresh(&self, _arena: &ArenaInfo) {}

    /// Remove every status bar of the arena.
    fn remove_all(&self, _arena: &ArenaId) {}

    /// Stop every running scoreboard of the arena.
    fn stop_all(&self, _arena: &ArenaId) {}

    /// Remember the player's scoreboard from before they joined.
    fn cache_scoreboard(&self, _player: PlayerId) {}

    /// Give the player back the scoreboard cached on join.
    fn restore_scoreboard(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }
}

/// Join signs advertising the arena.
pub trait SignBoard: Send + Sync {
    fn update_sign(&self, _arena: &ArenaInfo) {}
}

/// The game world the players live in.
pub trait World: Presence {
    /// Everyone connected to the server, in or out of an arena.
    fn online_players(&self) -> Vec<PlayerId> {
        Vec::new()
    }

    fn teleport(&self, _player: PlayerId, _to: &Location) -> HookResult {
        Ok(())
    }

    /// Make two players see each other.
    fn show_to_each_other(&self, _a: PlayerId, _b: PlayerId) {}

    /// Hide everyone outside `roster` from `player` and vice versa.
    fn hide_outsiders(&self, _player: PlayerId, _roster: &[PlayerId]) -> HookResult {
        Ok(())
    }

    /// Undo [`hide_outsiders`](Self::hide_outsiders).
    fn show_outsiders(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    fn update_name_tags(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    /// Cosmetic countdown shown on the level indicator.
    fn set_level(&self, _player: PlayerId, _level: i32) {}

    /// Reset the level indicator to zero and the bar to full.
    fn reset_level(&self, _player: PlayerId) {}

    fn set_game_mode(&self, _player: PlayerId, _mode: GameMode) -> HookResult {
        Ok(())
    }

    /// Reset flight, walk/fly speed, hunger and potion effects.
    fn reset_movement(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    /// Clear inventory and armor.
    fn clear_inventory(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    fn reset_attack_cooldown(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    fn shutdown_server(&self) {}
}

/// Reward triggers configured by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardType {
    EndGame,
    Win,
    Lose,
}

pub trait RewardEngine: Send + Sync {
    fn perform_reward(&self, _player: PlayerId, _reward: RewardType) -> HookResult {
        Ok(())
    }
}

/// Inventory snapshots taken on join and restored after a match.
pub trait InventoryStore: Send + Sync {
    fn save_inventory(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    fn load_inventory(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }
}

/// Cross-server hand-off.
pub trait HubTransfer: Send + Sync {
    /// Send a player back to the hub server.
    fn connect_to_hub(&self, _player: PlayerId) -> HookResult {
        Ok(())
    }

    /// Pick the arena that receives the next hub-transferred cohort.
    fn shuffle_next_arena(&self) -> Option<ArenaId> {
        None
    }

    /// Try to put a player into `arena`.
    fn join_attempt(&self, _player: PlayerId, _arena: &ArenaId) {}
}

/// Grants the starting kit.
pub trait KitProvider: Send + Sync {
    fn give_kit(&self, _player: PlayerId, _arena: &ArenaId) -> HookResult {
        Ok(())
    }
}

/// Decides how a match ends.
///
/// Called from the `InGame` tick when fewer than two players are alive or
/// time is up. An implementation normally scores the match and then calls
/// [`Arena::begin_ending`].
pub trait Referee: Send + Sync {
    fn stop_game(&self, arena: &mut Arena);
}

/// Implements every collaborator trait with the no-op defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl Presence for Noop {}
impl Notifier for Noop {}
impl StatusDisplay for Noop {}
impl SignBoard for Noop {}
impl World for Noop {}
impl RewardEngine for Noop {}
impl InventoryStore for Noop {}
impl HubTransfer for Noop {}
impl KitProvider for Noop {}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// The full set of collaborators injected into an arena.
#[derive(Clone)]
pub struct Hooks {
    pub notifier: Arc<dyn Notifier>,
    pub display: Arc<dyn StatusDisplay>,
    pub signs: Arc<dyn SignBoard>,
    pub world: Arc<dyn World>,
    pub rewards: Arc<dyn RewardEngine>,
    pub inventory: Arc<dyn InventoryStore>,
    pub hub: Arc<dyn HubTransfer>,
    pub kits: Arc<dyn KitProvider>,
    pub referee: Arc<dyn Referee>,
}

impl Default for Hooks {
    /// No-op collaborators and the [`StandardReferee`].
    fn default() -> Self {
        let noop = Arc::new(Noop);
        Self {
            notifier: noop.clone(),
            display: noop.clone(),
            signs: noop.clone(),
            world: noop.clone(),
            rewards: noop.clone(),
            inventory: noop.clone(),
            hub: noop.clone(),
            kits: noop,
            referee: Arc::new(StandardReferee),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
