//! Arena actors and the registry, driven by paused Tokio time.

use std::time::Duration;

use arenaloop_arena::{
    spawn_arena, Arena, ArenaError, ArenaEvent, ArenaId, ArenaRegistry, ArenaSettings,
    ArenaState, EventBus, Hooks, Location, PlayerId, StatKind,
};
use arenaloop_tick::TickConfig;
use tokio::sync::broadcast;

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

fn one_second() -> TickConfig {
    TickConfig {
        initial_jitter: Duration::ZERO,
        ..TickConfig::every(Duration::from_secs(1))
    }
}

fn settings() -> ArenaSettings {
    ArenaSettings {
        min_players: 2,
        max_players: 2,
        lobby_waiting_time: 3,
        lobby_starting_time: 2,
        gameplay_time: 5,
        ending_time: 1,
    }
}

fn arena(id: &str, bus: &EventBus) -> Arena {
    Arena::new(ArenaId::new(id), settings(), Hooks::default(), bus.clone())
        .with_spawn_points(vec![
            Location::new("map", 1.0, 64.0, 0.0),
            Location::new("map", 2.0, 64.0, 0.0),
        ])
        .with_lobby(Location::new("lobby", 0.0, 64.0, 0.0))
}

async fn next_matching(
    rx: &mut broadcast::Receiver<ArenaEvent>,
    pred: impl Fn(&ArenaEvent) -> bool,
) -> ArenaEvent {
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            let event = rx.recv().await.expect("event bus open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event within two minutes")
}

/// Lets the actor run the ticks due within `d`.
async fn advance(d: Duration) {
    tokio::time::sleep(d).await;
}

// =========================================================================
// Actor
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_unstarted_arena_does_not_tick() {
    let bus = EventBus::default();
    let handle = spawn_arena(arena("a", &bus), one_second(), 16);

    advance(Duration::from_secs(10)).await;

    let info = handle.info().await.unwrap();
    assert_eq!(info.state, ArenaState::Inactive);
    assert!(matches!(handle.join(P1).await, Err(ArenaError::InvalidState(_))));
}

#[tokio::test(start_paused = true)]
async fn test_start_arms_once() {
    let bus = EventBus::default();
    let handle = spawn_arena(arena("a", &bus), one_second(), 16);

    handle.start().await.unwrap();
    assert_eq!(handle.info().await.unwrap().state, ArenaState::Restarting);
    assert!(matches!(handle.start().await, Err(ArenaError::AlreadyStarted(_))));

    advance(Duration::from_millis(1500)).await;
    assert_eq!(
        handle.info().await.unwrap().state,
        ArenaState::WaitingForPlayers
    );
}

#[tokio::test(start_paused = true)]
async fn test_full_match_through_actor() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let handle = spawn_arena(arena("a", &bus), one_second(), 16);
    handle.start().await.unwrap();
    advance(Duration::from_millis(1500)).await;

    handle.join(P1).await.unwrap();
    handle.join(P2).await.unwrap();

    next_matching(&mut rx, |e| matches!(e, ArenaEvent::GameStarted { .. })).await;
    let info = handle.info().await.unwrap();
    assert_eq!(info.state, ArenaState::InGame);
    assert_eq!(info.timer, 5);

    assert_eq!(handle.add_stat(P1, StatKind::LocalKills, 2).await.unwrap(), 2);
    handle.set_spectator(P2, true).await.unwrap();

    let ended = next_matching(&mut rx, |e| matches!(e, ArenaEvent::GameEnded { .. })).await;
    assert_eq!(
        ended,
        ArenaEvent::GameEnded {
            arena: ArenaId::new("a"),
            players: vec![P1, P2],
        }
    );

    next_matching(&mut rx, |e| {
        matches!(
            e,
            ArenaEvent::StateChanged {
                state: ArenaState::WaitingForPlayers,
                ..
            }
        )
    })
    .await;
    let info = handle.info().await.unwrap();
    assert_eq!(info.player_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_deschedules_ticks() {
    let bus = EventBus::default();
    let handle = spawn_arena(arena("a", &bus), one_second(), 16);
    handle.start().await.unwrap();
    advance(Duration::from_millis(1500)).await;

    handle.join(P1).await.unwrap();
    advance(Duration::from_secs(2)).await;
    let timer = handle.info().await.unwrap().timer;
    assert!(timer > 0);

    handle.stop().await.unwrap();
    advance(Duration::from_secs(10)).await;

    let info = handle.info().await.unwrap();
    assert_eq!(info.timer, timer);
    assert_eq!(info.state, ArenaState::WaitingForPlayers);
    // Commands are still served.
    handle.leave(P1).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_makes_handle_unavailable() {
    let bus = EventBus::default();
    let handle = spawn_arena(arena("a", &bus), one_second(), 16);

    handle.shutdown().await.unwrap();

    assert!(matches!(handle.info().await, Err(ArenaError::Unavailable(_))));
}

#[tokio::test(start_paused = true)]
async fn test_force_start_through_handle() {
    let bus = EventBus::default();
    let handle = spawn_arena(
        Arena::new(
            ArenaId::new("a"),
            ArenaSettings {
                max_players: 4,
                ..settings()
            },
            Hooks::default(),
            bus.clone(),
        ),
        one_second(),
        16,
    );
    handle.start().await.unwrap();
    advance(Duration::from_millis(1500)).await;
    handle.join(P1).await.unwrap();

    assert!(matches!(
        handle.force_start().await,
        Err(ArenaError::InvalidState(_))
    ));

    handle.join(P2).await.unwrap();
    handle.force_start().await.unwrap();
    assert_eq!(handle.info().await.unwrap().state, ArenaState::Starting);

    advance(Duration::from_secs(1)).await;
    assert_eq!(handle.info().await.unwrap().state, ArenaState::InGame);
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_registry_rejects_duplicate_ids() {
    let bus = EventBus::default();
    let mut registry = ArenaRegistry::new(one_second());

    registry.register(arena("a", &bus)).unwrap();
    assert!(matches!(
        registry.register(arena("a", &bus)),
        Err(ArenaError::InvalidState(_))
    ));
    assert_eq!(registry.arena_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_registry_one_arena_per_player() {
    let bus = EventBus::default();
    let mut registry = ArenaRegistry::new(one_second());
    let a = registry.register(arena("a", &bus)).unwrap();
    let b = registry.register(arena("b", &bus)).unwrap();
    assert_eq!(registry.start_all().await, 2);
    advance(Duration::from_millis(1500)).await;

    registry.join(P1, &a).await.unwrap();
    assert!(matches!(
        registry.join(P1, &b).await,
        Err(ArenaError::AlreadyInArena(p, ref current)) if p == P1 && *current == a
    ));

    assert_eq!(registry.leave(P1).await.unwrap(), a);
    assert_eq!(registry.player_arena(P1), None);
    registry.join(P1, &b).await.unwrap();
    assert_eq!(registry.player_arena(P1), Some(&b));
}

#[tokio::test(start_paused = true)]
async fn test_registry_unknown_arena() {
    let mut registry = ArenaRegistry::new(one_second());
    let missing = ArenaId::new("missing");

    assert!(matches!(
        registry.join(P1, &missing).await,
        Err(ArenaError::NotFound(_))
    ));
    assert!(matches!(
        registry.start(&missing).await,
        Err(ArenaError::NotFound(_))
    ));
    assert!(matches!(registry.leave(P1).await, Err(ArenaError::InvalidState(_))));
}

#[tokio::test(start_paused = true)]
async fn test_registry_lists_joinable_arenas() {
    let bus = EventBus::default();
    let mut registry = ArenaRegistry::new(one_second());
    let a = registry.register(arena("a", &bus)).unwrap();
    let b = registry.register(arena("b", &bus)).unwrap();
    registry.register(arena("idle", &bus)).unwrap();
    registry.start(&a).await.unwrap();
    registry.start(&b).await.unwrap();
    advance(Duration::from_millis(1500)).await;

    let ids: Vec<ArenaId> = registry
        .list_joinable()
        .await
        .into_iter()
        .map(|i| i.arena_id)
        .collect();
    assert_eq!(ids, vec![a.clone(), b.clone()]);

    registry.join(P1, &b).await.unwrap();
    registry.join(P2, &b).await.unwrap();
    let ids: Vec<ArenaId> = registry
        .list_joinable()
        .await
        .into_iter()
        .map(|i| i.arena_id)
        .collect();
    assert_eq!(ids, vec![a]);
}

#[tokio::test(start_paused = true)]
async fn test_registry_trims_index_on_game_ended() {
    let bus = EventBus::default();
    let mut registry = ArenaRegistry::new(one_second());
    let a = registry.register(arena("a", &bus)).unwrap();
    let b = registry.register(arena("b", &bus)).unwrap();
    registry.start_all().await;
    advance(Duration::from_millis(1500)).await;
    registry.join(P1, &a).await.unwrap();
    registry.join(P2, &b).await.unwrap();

    registry.apply_event(&ArenaEvent::GameEnded {
        arena: a.clone(),
        players: vec![P1, P2],
    });

    assert_eq!(registry.player_arena(P1), None);
    assert_eq!(registry.player_arena(P2), Some(&b), "other arena untouched");
}

/// Runs a registry-joined match in `a` to completion without feeding
/// any events back to the registry.
async fn finish_match_unseen(
    registry: &ArenaRegistry,
    a: &ArenaId,
    rx: &mut broadcast::Receiver<ArenaEvent>,
) {
    next_matching(rx, |e| matches!(e, ArenaEvent::GameStarted { .. })).await;
    registry.handle(a).unwrap().set_spectator(P2, true).await.unwrap();
    next_matching(rx, |e| {
        matches!(
            e,
            ArenaEvent::StateChanged {
                state: ArenaState::WaitingForPlayers,
                ..
            }
        )
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_registry_join_drops_entry_the_arena_no_longer_holds() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let mut registry = ArenaRegistry::new(one_second());
    let a = registry.register(arena("a", &bus)).unwrap();
    let b = registry.register(arena("b", &bus)).unwrap();
    registry.start_all().await;
    advance(Duration::from_millis(1500)).await;
    registry.join(P1, &a).await.unwrap();
    registry.join(P2, &a).await.unwrap();

    finish_match_unseen(&registry, &a, &mut rx).await;
    assert_eq!(registry.player_arena(P1), Some(&a), "index not told yet");

    registry.join(P1, &b).await.unwrap();
    assert_eq!(registry.player_arena(P1), Some(&b));
}

#[tokio::test(start_paused = true)]
async fn test_registry_reconcile_rebuilds_index_from_arenas() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let mut registry = ArenaRegistry::new(one_second());
    let a = registry.register(arena("a", &bus)).unwrap();
    let b = registry.register(arena("b", &bus)).unwrap();
    registry.start_all().await;
    advance(Duration::from_millis(1500)).await;
    registry.join(P1, &a).await.unwrap();
    registry.join(P2, &a).await.unwrap();
    registry.join(PlayerId(3), &b).await.unwrap();

    finish_match_unseen(&registry, &a, &mut rx).await;

    assert_eq!(registry.reconcile().await, 2);
    assert_eq!(registry.player_arena(P1), None);
    assert_eq!(registry.player_arena(P2), None);
    assert_eq!(registry.player_arena(PlayerId(3)), Some(&b), "still a member");
    assert_eq!(registry.reconcile().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_handle_lists_members() {
    let bus = EventBus::default();
    let handle = spawn_arena(arena("a", &bus), one_second(), 16);
    handle.start().await.unwrap();
    advance(Duration::from_millis(1500)).await;
    assert!(handle.members().await.unwrap().is_empty());

    handle.join(P1).await.unwrap();
    assert_eq!(handle.members().await.unwrap(), vec![P1]);
}

#[tokio::test(start_paused = true)]
async fn test_registry_destroy() {
    let bus = EventBus::default();
    let mut registry = ArenaRegistry::new(one_second());
    let a = registry.register(arena("a", &bus)).unwrap();
    registry.start(&a).await.unwrap();
    advance(Duration::from_millis(1500)).await;
    registry.join(P1, &a).await.unwrap();

    registry.destroy(&a).await.unwrap();

    assert_eq!(registry.arena_count(), 0);
    assert_eq!(registry.player_arena(P1), None);
    assert!(matches!(registry.destroy(&a).await, Err(ArenaError::NotFound(_))));
}
