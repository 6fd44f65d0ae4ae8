//! Lifecycle events published for external listeners.
//!
//! The arena never consumes its own events. Stat trackers, displays and
//! the registry subscribe independently through [`EventBus::subscribe`].

use tokio::sync::broadcast;

use crate::{ArenaId, ArenaState, PlayerId, StatKind};

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Something that happened in an arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaEvent {
    /// The arena entered `state`. Published after the state is assigned.
    StateChanged { arena: ArenaId, state: ArenaState },

    /// A match began.
    GameStarted { arena: ArenaId },

    /// A match was torn down; `players` is the roster before it was cleared.
    GameEnded { arena: ArenaId, players: Vec<PlayerId> },

    /// A player's statistic was written.
    StatisticChanged {
        arena: ArenaId,
        player: PlayerId,
        kind: StatKind,
        value: i32,
    },
}

/// Publishing side of the event channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ArenaEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new listener. It sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ArenaEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Having no listeners is not an error.
    pub fn publish(&self, event: ArenaEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("arena event dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(ArenaEvent::GameStarted {
            arena: ArenaId::new("a"),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let arena = ArenaId::new("a");
        bus.publish(ArenaEvent::StateChanged {
            arena: arena.clone(),
            state: ArenaState::InGame,
        });
        bus.publish(ArenaEvent::GameStarted {
            arena: arena.clone(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            ArenaEvent::StateChanged {
                arena: arena.clone(),
                state: ArenaState::InGame
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ArenaEvent::GameStarted { arena });
        assert!(rx.try_recv().is_err());
    }
}
