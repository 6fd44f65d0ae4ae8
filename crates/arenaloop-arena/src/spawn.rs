//! Start-location assignment.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::{ArenaError, ArenaId, Location, PlayerId};

/// Hands out the arena's spawn points.
///
/// The pool is fixed for the arena's lifetime. When there are more
/// players than points, the overflow gets random points from the pool.
pub struct SpawnAllocator {
    arena: ArenaId,
    points: Vec<Location>,
    rng: StdRng,
}

impl SpawnAllocator {
    pub fn new(arena: ArenaId, points: Vec<Location>) -> Self {
        Self::with_rng(arena, points, StdRng::from_os_rng())
    }

    /// Allocator with a fixed random source, for reproducible fallbacks.
    pub fn with_rng(arena: ArenaId, points: Vec<Location>, rng: StdRng) -> Self {
        Self { arena, points, rng }
    }

    pub fn points(&self) -> &[Location] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Assigns a point to every player, by position in `players`.
    ///
    /// Players beyond the pool size get a random point instead.
    pub fn assign_all(
        &mut self,
        players: &[PlayerId],
    ) -> Result<Vec<(PlayerId, Location)>, ArenaError> {
        if self.points.is_empty() {
            return Err(ArenaError::NoSpawnPoints(self.arena.clone()));
        }

        if players.len() > self.points.len() {
            warn!(
                arena_id = %self.arena,
                players = players.len(),
                spawn_points = self.points.len(),
                "not enough spawn points, overflow players get random ones"
            );
        }

        let mut assignments = Vec::with_capacity(players.len());
        for (i, player) in players.iter().enumerate() {
            let location = match self.points.get(i) {
                Some(point) => point.clone(),
                None => self.random_point(),
            };
            assignments.push((*player, location));
        }
        Ok(assignments)
    }

    /// One random point, for single-player teleports such as late joins.
    pub fn assign_one(&mut self) -> Result<Location, ArenaError> {
        if self.points.is_empty() {
            return Err(ArenaError::NoSpawnPoints(self.arena.clone()));
        }
        Ok(self.random_point())
    }

    fn random_point(&mut self) -> Location {
        let i = self.rng.random_range(0..self.points.len());
        self.points[i].clone()
    }
}

impl std::fmt::Debug for SpawnAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnAllocator")
            .field("arena", &self.arena)
            .field("points", &self.points.len())
            .finish()
    }
}
