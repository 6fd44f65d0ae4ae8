//! Arena registry: owns the arena actors and routes players to them.

use std::collections::HashMap;

use arenaloop_tick::TickConfig;

use crate::actor::spawn_arena;
use crate::{Arena, ArenaError, ArenaEvent, ArenaHandle, ArenaId, ArenaInfo, PlayerId};

/// Default command channel size for arena actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Tracks every registered arena and which player is in which one.
///
/// A player is in at most one arena at a time. The index is trimmed
/// from [`ArenaEvent::GameEnded`] events through [`apply_event`], since
/// arenas clear their own rosters when a match is torn down. Events can
/// be missed; [`reconcile`] rebuilds the index from the arenas.
///
/// [`apply_event`]: Self::apply_event
/// [`reconcile`]: Self::reconcile
pub struct ArenaRegistry {
    arenas: HashMap<ArenaId, ArenaHandle>,
    player_arenas: HashMap<PlayerId, ArenaId>,
    tick: TickConfig,
}

impl ArenaRegistry {
    /// Creates an empty registry; arenas tick according to `tick`.
    pub fn new(tick: TickConfig) -> Self {
        Self {
            arenas: HashMap::new(),
            player_arenas: HashMap::new(),
            tick,
        }
    }

    /// Spawns an actor for `arena`. The arena is not started yet.
    pub fn register(&mut self, arena: Arena) -> Result<ArenaId, ArenaError> {
        let arena_id = arena.id().clone();
        if self.arenas.contains_key(&arena_id) {
            return Err(ArenaError::InvalidState(format!(
                "arena {arena_id} is already registered"
            )));
        }
        if let Err(defect) = arena.readiness() {
            tracing::warn!(%arena_id, %defect, "arena registered with a configuration defect");
        }

        let handle = spawn_arena(arena, self.tick.clone(), DEFAULT_CHANNEL_SIZE);
        self.arenas.insert(arena_id.clone(), handle);
        tracing::info!(%arena_id, "arena registered");
        Ok(arena_id)
    }

    pub async fn start(&self, arena_id: &ArenaId) -> Result<(), ArenaError> {
        self.handle(arena_id)?.start().await
    }

    /// Starts every registered arena. Returns how many were armed.
    pub async fn start_all(&self) -> usize {
        let mut started = 0;
        for handle in self.arenas.values() {
            match handle.start().await {
                Ok(()) => started += 1,
                Err(error) => {
                    tracing::debug!(arena_id = %handle.arena_id(), %error, "arena not started");
                }
            }
        }
        started
    }

    pub async fn stop(&self, arena_id: &ArenaId) -> Result<(), ArenaError> {
        self.handle(arena_id)?.stop().await
    }

    /// Adds a player to an arena, keeping the one-arena-per-player rule.
    ///
    /// An index entry the owning arena no longer backs is dropped first.
    pub async fn join(&mut self, player: PlayerId, arena_id: &ArenaId) -> Result<(), ArenaError> {
        if let Some(current) = self.player_arenas.get(&player).cloned() {
            if self.holds(&current, player).await {
                return Err(ArenaError::AlreadyInArena(player, current));
            }
            tracing::debug!(%player, arena_id = %current, "dropping stale index entry");
            self.player_arenas.remove(&player);
        }
        self.handle(arena_id)?.join(player).await?;
        self.player_arenas.insert(player, arena_id.clone());
        Ok(())
    }

    /// Removes a player from whichever arena they are in.
    pub async fn leave(&mut self, player: PlayerId) -> Result<ArenaId, ArenaError> {
        let arena_id = self.player_arenas.get(&player).cloned().ok_or_else(|| {
            ArenaError::InvalidState(format!("player {player} is not in any arena"))
        })?;

        if let Some(handle) = self.arenas.get(&arena_id) {
            match handle.leave(player).await {
                // Already dropped by a restart the index hasn't seen yet.
                Ok(()) | Err(ArenaError::NotInArena(..)) => {}
                Err(error) => return Err(error),
            }
        }
        self.player_arenas.remove(&player);
        Ok(arena_id)
    }

    pub async fn force_start(&self, arena_id: &ArenaId) -> Result<(), ArenaError> {
        self.handle(arena_id)?.force_start().await
    }

    pub async fn arena_info(&self, arena_id: &ArenaId) -> Result<ArenaInfo, ArenaError> {
        self.handle(arena_id)?.info().await
    }

    /// Arenas currently accepting participants and not full.
    pub async fn list_joinable(&self) -> Vec<ArenaInfo> {
        let mut infos = Vec::with_capacity(self.arenas.len());
        for handle in self.arenas.values() {
            if let Ok(info) = handle.info().await {
                if info.state.is_joinable() && info.player_count < info.max_players {
                    infos.push(info);
                }
            }
        }
        infos.sort_by(|a, b| a.arena_id.cmp(&b.arena_id));
        infos
    }

    /// Shuts an arena's actor down and forgets its players.
    pub async fn destroy(&mut self, arena_id: &ArenaId) -> Result<(), ArenaError> {
        let handle = self
            .arenas
            .remove(arena_id)
            .ok_or_else(|| ArenaError::NotFound(arena_id.clone()))?;
        let _ = handle.shutdown().await;
        self.player_arenas.retain(|_, a| a != arena_id);
        tracing::info!(%arena_id, "arena destroyed");
        Ok(())
    }

    /// Keeps the player index in line with arena-side roster changes.
    pub fn apply_event(&mut self, event: &ArenaEvent) {
        if let ArenaEvent::GameEnded { arena, players } = event {
            for player in players {
                if self.player_arenas.get(player) == Some(arena) {
                    self.player_arenas.remove(player);
                }
            }
        }
    }

    /// Drops every index entry whose arena no longer has the player.
    ///
    /// Returns how many entries were removed. Arenas that cannot answer
    /// keep their entries.
    pub async fn reconcile(&mut self) -> usize {
        let mut stale = Vec::new();
        for (arena_id, handle) in &self.arenas {
            let Ok(members) = handle.members().await else {
                continue;
            };
            stale.extend(
                self.player_arenas
                    .iter()
                    .filter(|(player, a)| *a == arena_id && !members.contains(*player))
                    .map(|(player, _)| *player),
            );
        }
        for player in &stale {
            self.player_arenas.remove(player);
        }
        if !stale.is_empty() {
            tracing::info!(removed = stale.len(), "player index reconciled");
        }
        stale.len()
    }

    /// Whether `arena_id` still has `player` on its roster. An arena
    /// that cannot answer is assumed to.
    async fn holds(&self, arena_id: &ArenaId, player: PlayerId) -> bool {
        match self.arenas.get(arena_id) {
            Some(handle) => handle
                .members()
                .await
                .map_or(true, |members| members.contains(&player)),
            None => false,
        }
    }

    pub fn player_arena(&self, player: PlayerId) -> Option<&ArenaId> {
        self.player_arenas.get(&player)
    }

    pub fn handle(&self, arena_id: &ArenaId) -> Result<&ArenaHandle, ArenaError> {
        self.arenas
            .get(arena_id)
            .ok_or_else(|| ArenaError::NotFound(arena_id.clone()))
    }

    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }

    /// Registered arena ids in ascending order.
    pub fn arena_ids(&self) -> Vec<ArenaId> {
        let mut ids: Vec<ArenaId> = self.arenas.keys().cloned().collect();
        ids.sort();
        ids
    }
}
