//! Error types for the arena layer.

use crate::{ArenaId, PlayerId};

/// Errors returned by arena, actor and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// No arena is registered under this id.
    #[error("arena {0} not found")]
    NotFound(ArenaId),

    /// The arena already holds `max_players` participants.
    #[error("arena {0} is full")]
    ArenaFull(ArenaId),

    /// The player is already in an arena.
    #[error("player {0} already in arena {1}")]
    AlreadyInArena(PlayerId, ArenaId),

    /// The player is not in this arena.
    #[error("player {0} not in arena {1}")]
    NotInArena(PlayerId, ArenaId),

    /// The arena is in a state that doesn't allow this operation.
    #[error("invalid arena state for this operation: {0}")]
    InvalidState(String),

    /// The arena's actor is gone or its command channel is closed.
    #[error("arena {0} is unavailable")]
    Unavailable(ArenaId),

    /// The arena has no spawn points configured.
    #[error("arena {0} has no spawn points")]
    NoSpawnPoints(ArenaId),

    /// The arena has no lobby location configured.
    #[error("arena {0} has no lobby location")]
    NoLobby(ArenaId),

    /// The tick loop of this arena was already armed once.
    #[error("arena {0} was already started")]
    AlreadyStarted(ArenaId),
}

/// Failure reported by an external collaborator for one side effect.
///
/// The tick loop logs these and carries on with the next player.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The player left the server before the side effect could apply.
    #[error("player {0} is offline")]
    Offline(PlayerId),

    /// The collaborator failed for another reason.
    #[error("{0}")]
    Failed(String),
}
