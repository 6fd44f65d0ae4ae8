//! Per-player participant record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ArenaEvent, ArenaId, EventBus, PlayerId};

/// Kinds of statistic tracked for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Kills,
    Deaths,
    Wins,
    Loses,
    GamesPlayed,
    HighestScore,
    /// Kills in the current match.
    LocalKills,
    /// Deaths in the current match.
    LocalDeaths,
}

impl StatKind {
    pub const ALL: [StatKind; 8] = [
        StatKind::Kills,
        StatKind::Deaths,
        StatKind::Wins,
        StatKind::Loses,
        StatKind::GamesPlayed,
        StatKind::HighestScore,
        StatKind::LocalKills,
        StatKind::LocalDeaths,
    ];

    /// Persistent statistics survive [`User::reset_stats`].
    pub fn is_persistent(self) -> bool {
        !matches!(self, StatKind::LocalKills | StatKind::LocalDeaths)
    }
}

/// A player while they are inside an arena.
///
/// Created on join and dropped on leave or when the arena restarts.
/// Every statistic write publishes [`ArenaEvent::StatisticChanged`].
#[derive(Debug)]
pub struct User {
    id: PlayerId,
    arena: ArenaId,
    spectator: bool,
    stats: HashMap<StatKind, i32>,
    events: EventBus,
}

impl User {
    pub fn new(id: PlayerId, arena: ArenaId, events: EventBus) -> Self {
        Self {
            id,
            arena,
            spectator: false,
            stats: HashMap::new(),
            events,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn arena(&self) -> &ArenaId {
        &self.arena
    }

    pub fn is_spectator(&self) -> bool {
        self.spectator
    }

    pub fn set_spectator(&mut self, spectator: bool) {
        self.spectator = spectator;
    }

    /// Current value of a statistic; 0 if it was never written.
    pub fn get_stat(&self, kind: StatKind) -> i32 {
        self.stats.get(&kind).copied().unwrap_or(0)
    }

    pub fn set_stat(&mut self, kind: StatKind, value: i32) {
        self.stats.insert(kind, value);
        self.events.publish(ArenaEvent::StatisticChanged {
            arena: self.arena.clone(),
            player: self.id,
            kind,
            value,
        });
    }

    /// Adds `delta` to a statistic and returns the new value.
    pub fn add_stat(&mut self, kind: StatKind, delta: i32) -> i32 {
        let value = self.get_stat(kind) + delta;
        self.set_stat(kind, value);
        value
    }

    /// Zeroes every non-persistent statistic.
    pub fn reset_stats(&mut self) {
        for kind in StatKind::ALL {
            if !kind.is_persistent() {
                self.set_stat(kind, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(bus: &EventBus) -> User {
        User::new(PlayerId(1), ArenaId::new("a"), bus.clone())
    }

    #[test]
    fn test_uninitialized_stat_is_zero() {
        let bus = EventBus::default();
        let u = user(&bus);
        assert_eq!(u.get_stat(StatKind::Kills), 0);
    }

    #[test]
    fn test_add_then_get_round_trip() {
        let bus = EventBus::default();
        let mut u = user(&bus);
        assert_eq!(u.add_stat(StatKind::Kills, 5), 5);
        assert_eq!(u.get_stat(StatKind::Kills), 5);
        assert_eq!(u.add_stat(StatKind::Kills, 2), 7);
    }

    #[test]
    fn test_every_write_emits_change_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut u = user(&bus);
        u.add_stat(StatKind::GamesPlayed, 1);

        assert_eq!(
            rx.try_recv().unwrap(),
            ArenaEvent::StatisticChanged {
                arena: ArenaId::new("a"),
                player: PlayerId(1),
                kind: StatKind::GamesPlayed,
                value: 1,
            }
        );
    }

    #[test]
    fn test_reset_stats_keeps_persistent_kinds() {
        let bus = EventBus::default();
        let mut u = user(&bus);
        u.set_stat(StatKind::Kills, 10);
        u.set_stat(StatKind::LocalKills, 3);
        u.reset_stats();
        assert_eq!(u.get_stat(StatKind::Kills), 10);
        assert_eq!(u.get_stat(StatKind::LocalKills), 0);
    }
}
