//! Hand-off between arenas on the same server.
//!
//! Arenas call [`HubTransfer`] synchronously from inside their tick, but
//! joining another arena goes through the async registry. [`ChannelHub`]
//! bridges the two: it picks the next arena itself and queues join
//! requests for the server loop.

use std::sync::Arc;

use arenaloop_arena::{ArenaId, HookResult, HubTransfer, PlayerId};
use rand::seq::IndexedRandom;
use tokio::sync::mpsc;

/// A queued request to move a player into another arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubJoin {
    pub player: PlayerId,
    pub arena: ArenaId,
}

/// [`HubTransfer`] that routes join attempts to the server loop.
///
/// Sending a player to the hub itself is left to `upstream`, the host
/// platform's transfer.
pub struct ChannelHub {
    arenas: Vec<ArenaId>,
    sender: mpsc::UnboundedSender<HubJoin>,
    upstream: Arc<dyn HubTransfer>,
}

impl ChannelHub {
    /// Creates a hub choosing among `arenas`, and the receiving end of
    /// its join queue.
    pub fn new(
        arenas: Vec<ArenaId>,
        upstream: Arc<dyn HubTransfer>,
    ) -> (Self, mpsc::UnboundedReceiver<HubJoin>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let hub = Self {
            arenas,
            sender,
            upstream,
        };
        (hub, receiver)
    }
}

impl HubTransfer for ChannelHub {
    fn connect_to_hub(&self, player: PlayerId) -> HookResult {
        self.upstream.connect_to_hub(player)
    }

    fn shuffle_next_arena(&self) -> Option<ArenaId> {
        self.arenas.choose(&mut rand::rng()).cloned()
    }

    fn join_attempt(&self, player: PlayerId, arena: &ArenaId) {
        let request = HubJoin {
            player,
            arena: arena.clone(),
        };
        if self.sender.send(request).is_err() {
            tracing::warn!(%player, arena_id = %arena, "server loop gone, hand-off dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use arenaloop_arena::Noop;

    use super::*;

    fn ids(names: &[&str]) -> Vec<ArenaId> {
        names.iter().map(|n| ArenaId::new(*n)).collect()
    }

    #[test]
    fn test_shuffle_picks_a_known_arena() {
        let (hub, _rx) = ChannelHub::new(ids(&["a", "b", "c"]), Arc::new(Noop));
        for _ in 0..20 {
            let next = hub.shuffle_next_arena().unwrap();
            assert!(ids(&["a", "b", "c"]).contains(&next));
        }
    }

    #[test]
    fn test_shuffle_without_arenas() {
        let (hub, _rx) = ChannelHub::new(Vec::new(), Arc::new(Noop));
        assert_eq!(hub.shuffle_next_arena(), None);
    }

    #[test]
    fn test_join_attempts_are_queued_in_order() {
        let (hub, mut rx) = ChannelHub::new(ids(&["a"]), Arc::new(Noop));
        hub.join_attempt(PlayerId(1), &ArenaId::new("a"));
        hub.join_attempt(PlayerId(2), &ArenaId::new("a"));

        assert_eq!(
            rx.try_recv().unwrap(),
            HubJoin {
                player: PlayerId(1),
                arena: ArenaId::new("a"),
            }
        );
        assert_eq!(rx.try_recv().unwrap().player, PlayerId(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_join_attempt_after_receiver_dropped_is_harmless() {
        let (hub, rx) = ChannelHub::new(ids(&["a"]), Arc::new(Noop));
        drop(rx);
        hub.join_attempt(PlayerId(1), &ArenaId::new("a"));
    }
}
