//! The set of players joined to an arena.
//!
//! # Concurrency note
//!
//! `PlayerRoster` is a plain `HashMap` with no locking. It is owned by
//! the arena actor, which serializes joins, leaves and ticks through its
//! command channel. Disconnects are handled at read time: every snapshot
//! asks a [`Presence`] which members are still online.

use std::collections::HashMap;

use crate::{Message, Notifier, PlayerId, Presence, User};

#[derive(Debug, Default)]
pub struct PlayerRoster {
    users: HashMap<PlayerId, User>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user. Returns `false` if that player is already present.
    pub fn add(&mut self, user: User) -> bool {
        if self.users.contains_key(&user.id()) {
            return false;
        }
        self.users.insert(user.id(), user);
        true
    }

    pub fn remove(&mut self, player: PlayerId) -> Option<User> {
        self.users.remove(&player)
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.users.contains_key(&player)
    }

    pub fn get(&self, player: PlayerId) -> Option<&User> {
        self.users.get(&player)
    }

    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut User> {
        self.users.get_mut(&player)
    }

    /// Raw member count, including players who went offline.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Every member, online or not, in ascending id order.
    pub fn ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn users_mut(&mut self) -> impl Iterator<Item = &mut User> {
        self.users.values_mut()
    }

    /// Members that are still connected, in ascending id order.
    pub fn live_snapshot<P: Presence + ?Sized>(&self, presence: &P) -> Vec<PlayerId> {
        let mut live: Vec<PlayerId> = self
            .users
            .keys()
            .copied()
            .filter(|id| presence.is_online(*id))
            .collect();
        live.sort_unstable();
        live
    }

    /// Connected members that are not spectating.
    pub fn alive_subset<P: Presence + ?Sized>(&self, presence: &P) -> Vec<PlayerId> {
        self.live_snapshot(presence)
            .into_iter()
            .filter(|id| self.users.get(id).is_some_and(|u| !u.is_spectator()))
            .collect()
    }

    /// Sends `message` to every connected member. Returns how many got it.
    pub fn broadcast<P, N>(&self, presence: &P, notifier: &N, message: &Message) -> usize
    where
        P: Presence + ?Sized,
        N: Notifier + ?Sized,
    {
        let live = self.live_snapshot(presence);
        for player in &live {
            notifier.send_message(*player, message);
        }
        live.len()
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.users.clear();
    }
}
