//! The arena lifecycle state machine.
//!
//! [`Arena::tick`] is called once per scheduler tick by the arena actor.
//! Each call reads the current state, applies that state's rule, and
//! either counts the clock down or transitions. A transition always
//! assigns the new state first; the status display, the
//! `StateChanged` event and the sign refresh all observe the new state.
//!
//! Joins, leaves and force-start requests arrive between ticks through
//! the same actor, so nothing here needs locking.

use std::sync::Arc;

use arenaloop_tick::Tickable;
use tracing::{debug, error, info, warn};

use crate::{
    ArenaError, ArenaEvent, ArenaId, ArenaSettings, ArenaState, CountdownClock, EventBus,
    GameMode, HookResult, Hooks, Location, Message, MessageKey, PlayerId, PlayerRoster,
    Preferences, RewardType, SpawnAllocator, StatKind, User,
};

/// Lobby reminder interval while the arena is below its minimum.
pub const LOBBY_REMINDER_TICKS: i32 = 45;

/// Countdown values at which a "starting in" message is shown, besides
/// the final five.
const ANNOUNCED_COUNTDOWN: [i32; 2] = [15, 10];

/// Remaining match times announced with a title.
const ANNOUNCED_TIME_LEFT: [i32; 2] = [60, 30];

/// A snapshot of arena metadata, handed to displays and signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaInfo {
    pub arena_id: ArenaId,
    pub map_name: String,
    pub state: ArenaState,
    pub timer: i32,
    /// Connected members, spectators included.
    pub player_count: usize,
    pub min_players: usize,
    pub max_players: usize,
}

/// One arena instance: its roster, clock and lifecycle state.
pub struct Arena {
    id: ArenaId,
    map_name: String,
    state: ArenaState,
    roster: PlayerRoster,
    clock: CountdownClock,
    settings: ArenaSettings,
    preferences: Preferences,
    force_start: bool,
    spawns: SpawnAllocator,
    lobby_location: Option<Location>,
    end_location: Option<Location>,
    task_started: bool,
    hooks: Hooks,
    events: EventBus,
}

impl Arena {
    /// Creates an `Inactive` arena with no spawn points or locations.
    pub fn new(id: ArenaId, settings: ArenaSettings, hooks: Hooks, events: EventBus) -> Self {
        Self {
            spawns: SpawnAllocator::new(id.clone(), Vec::new()),
            id,
            map_name: String::new(),
            state: ArenaState::Inactive,
            roster: PlayerRoster::new(),
            clock: CountdownClock::default(),
            settings: settings.validated(),
            preferences: Preferences::default(),
            force_start: false,
            lobby_location: None,
            end_location: None,
            task_started: false,
            hooks,
            events,
        }
    }

    pub fn with_map_name(mut self, name: impl Into<String>) -> Self {
        self.map_name = name.into();
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_spawn_points(mut self, points: Vec<Location>) -> Self {
        self.spawns = SpawnAllocator::new(self.id.clone(), points);
        self
    }

    pub fn with_spawn_allocator(mut self, spawns: SpawnAllocator) -> Self {
        self.spawns = spawns;
        self
    }

    pub fn with_lobby(mut self, location: Location) -> Self {
        self.lobby_location = Some(location);
        self
    }

    pub fn with_end(mut self, location: Location) -> Self {
        self.end_location = Some(location);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &ArenaId {
        &self.id
    }

    pub fn state(&self) -> ArenaState {
        self.state
    }

    pub fn timer(&self) -> i32 {
        self.clock.get()
    }

    pub fn settings(&self) -> &ArenaSettings {
        &self.settings
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    pub fn is_force_start(&self) -> bool {
        self.force_start
    }

    /// Raw force-start flag. Consumed by the next `Starting` tick.
    pub fn set_force_start(&mut self, force_start: bool) {
        self.force_start = force_start;
    }

    pub fn is_task_started(&self) -> bool {
        self.task_started
    }

    /// Sets the minimum player count, never below 2. Raises the maximum
    /// when it would fall under the new minimum.
    pub fn set_min_players(&mut self, min_players: usize) {
        self.settings.min_players = min_players.max(ArenaSettings::MIN_PLAYERS_FLOOR);
        if self.settings.max_players < self.settings.min_players {
            warn!(
                arena_id = %self.id,
                max_players = self.settings.max_players,
                min_players = self.settings.min_players,
                "max_players raised to min_players"
            );
            self.settings.max_players = self.settings.min_players;
        }
    }

    /// Sets the maximum player count, never below the minimum.
    pub fn set_max_players(&mut self, max_players: usize) {
        if max_players < self.settings.min_players {
            warn!(
                arena_id = %self.id,
                max_players,
                min_players = self.settings.min_players,
                "max_players below min_players, clamped"
            );
        }
        self.settings.max_players = max_players.max(self.settings.min_players);
    }

    /// Connected members, spectators included.
    pub fn live_players(&self) -> Vec<PlayerId> {
        self.roster.live_snapshot(&*self.hooks.world)
    }

    /// Connected members that are not spectating.
    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.roster.alive_subset(&*self.hooks.world)
    }

    pub fn info(&self) -> ArenaInfo {
        ArenaInfo {
            arena_id: self.id.clone(),
            map_name: self.map_name.clone(),
            state: self.state,
            timer: self.clock.get(),
            player_count: self.live_players().len(),
            min_players: self.settings.min_players,
            max_players: self.settings.max_players,
        }
    }

    /// Reports configuration defects that will degrade a match.
    pub fn readiness(&self) -> Result<(), ArenaError> {
        if self.spawns.is_empty() {
            return Err(ArenaError::NoSpawnPoints(self.id.clone()));
        }
        if self.lobby_location.is_none() {
            return Err(ArenaError::NoLobby(self.id.clone()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lifecycle control
    // -----------------------------------------------------------------------

    /// Arms the arena: `Inactive → Restarting`. Only the first call has an
    /// effect; returns whether this call armed it.
    pub fn start(&mut self) -> bool {
        if self.task_started {
            debug!(arena_id = %self.id, "arena already started");
            return false;
        }
        self.task_started = true;
        self.set_state(ArenaState::Restarting);
        true
    }

    /// Operator force start: skips the rest of the lobby countdown.
    ///
    /// The `Starting` tick still falls back to the lobby below
    /// `min_players`, so the request is refused in that case.
    pub fn force_start(&mut self) -> Result<(), ArenaError> {
        let live = self.live_players().len();
        if !self.state.is_joinable() {
            return Err(ArenaError::InvalidState(format!(
                "cannot force start arena in state {}",
                self.state
            )));
        }
        if live < self.settings.min_players {
            return Err(ArenaError::InvalidState(format!(
                "force start needs {} players, arena has {live}",
                self.settings.min_players
            )));
        }
        if self.state == ArenaState::WaitingForPlayers {
            self.clock.set(self.settings.lobby_waiting_time);
            self.set_state(ArenaState::Starting);
        }
        self.force_start = true;
        info!(arena_id = %self.id, players = live, "force start requested");
        Ok(())
    }

    /// Moves a running match into its ending grace period.
    pub fn begin_ending(&mut self, ticks: i32) -> Result<(), ArenaError> {
        if self.state != ArenaState::InGame {
            return Err(ArenaError::InvalidState(format!(
                "cannot end a match in state {}",
                self.state
            )));
        }
        self.clock.set(ticks.max(0));
        self.set_state(ArenaState::Ending);
        Ok(())
    }

    fn set_state(&mut self, state: ArenaState) {
        if !self.state.can_transition_to(state) {
            warn!(
                arena_id = %self.id,
                from = %self.state,
                to = %state,
                "unexpected arena transition"
            );
        }
        let previous = self.state;
        self.state = state;
        info!(arena_id = %self.id, from = %previous, to = %state, "arena state changed");

        let info = self.info();
        self.hooks.display.refresh(&info);
        self.events.publish(ArenaEvent::StateChanged {
            arena: self.id.clone(),
            state,
        });
        self.hooks.signs.update_sign(&info);
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Adds a player.
    ///
    /// Lobby states accept participants up to `max_players`; a running
    /// match accepts spectators placed on a random spawn point.
    pub fn join(&mut self, player: PlayerId) -> Result<(), ArenaError> {
        if self.roster.contains(player) {
            return Err(ArenaError::AlreadyInArena(player, self.id.clone()));
        }
        let spectator = match self.state {
            ArenaState::WaitingForPlayers | ArenaState::Starting => {
                if self.live_players().len() >= self.settings.max_players {
                    return Err(ArenaError::ArenaFull(self.id.clone()));
                }
                false
            }
            ArenaState::InGame => true,
            state => {
                return Err(ArenaError::InvalidState(format!(
                    "cannot join arena in state {state}"
                )));
            }
        };

        if self.preferences.inventory_manager {
            self.report(player, "save inventory", self.hooks.inventory.save_inventory(player));
        }
        self.hooks.display.cache_scoreboard(player);

        let mut user = User::new(player, self.id.clone(), self.events.clone());
        user.set_spectator(spectator);
        self.roster.add(user);

        if spectator {
            self.place_spectator(player);
        } else {
            self.teleport_to_lobby(player);
        }

        info!(
            arena_id = %self.id,
            %player,
            spectator,
            players = self.roster.len(),
            "player joined"
        );
        self.hooks.signs.update_sign(&self.info());
        Ok(())
    }

    /// Removes a player and sends them back out of the arena.
    pub fn leave(&mut self, player: PlayerId) -> Result<User, ArenaError> {
        let user = self
            .roster
            .remove(player)
            .ok_or_else(|| ArenaError::NotInArena(player, self.id.clone()))?;

        self.hooks.world.reset_level(player);
        self.restore_player(player, false);
        if self.preferences.inventory_manager {
            self.report(player, "load inventory", self.hooks.inventory.load_inventory(player));
        }

        info!(
            arena_id = %self.id,
            %player,
            players = self.roster.len(),
            "player left"
        );
        self.hooks.signs.update_sign(&self.info());
        Ok(user)
    }

    pub fn set_spectator(&mut self, player: PlayerId, spectator: bool) -> Result<(), ArenaError> {
        let user = self
            .roster
            .get_mut(player)
            .ok_or_else(|| ArenaError::NotInArena(player, self.id.clone()))?;
        user.set_spectator(spectator);
        Ok(())
    }

    /// Adds to a member's statistic and returns the new value.
    pub fn add_stat(&mut self, player: PlayerId, kind: StatKind, delta: i32) -> Result<i32, ArenaError> {
        let user = self
            .roster
            .get_mut(player)
            .ok_or_else(|| ArenaError::NotInArena(player, self.id.clone()))?;
        Ok(user.add_stat(kind, delta))
    }

    /// Overwrites a member's statistic.
    pub fn set_stat(&mut self, player: PlayerId, kind: StatKind, value: i32) -> Result<(), ArenaError> {
        let user = self
            .roster
            .get_mut(player)
            .ok_or_else(|| ArenaError::NotInArena(player, self.id.clone()))?;
        user.set_stat(kind, value);
        Ok(())
    }

    pub fn stat(&self, player: PlayerId, kind: StatKind) -> Option<i32> {
        self.roster.get(player).map(|u| u.get_stat(kind))
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Runs one tick of the lifecycle.
    pub fn tick(&mut self) {
        let live = self.live_players();
        if self.state == ArenaState::WaitingForPlayers && live.is_empty() {
            return;
        }
        if self.state != ArenaState::Restarting {
            self.hooks.display.refresh(&self.info());
        }

        match self.state {
            ArenaState::Inactive => {}
            ArenaState::WaitingForPlayers => self.tick_waiting(&live),
            ArenaState::Starting => self.tick_starting(&live),
            ArenaState::InGame => self.tick_in_game(&live),
            ArenaState::Ending => self.tick_ending(),
            ArenaState::Restarting => self.tick_restarting(),
        }
    }

    fn tick_waiting(&mut self, live: &[PlayerId]) {
        let min_players = self.settings.min_players;

        if live.len() < min_players {
            if self.clock.is_expired() {
                self.clock.set(LOBBY_REMINDER_TICKS);
                self.broadcast(Message::new(MessageKey::WaitingForPlayers).arg(min_players));
            }
            self.clock.decrement();
            return;
        }

        self.show_players(live);
        self.clock.set(self.settings.lobby_waiting_time);
        self.set_state(ArenaState::Starting);
        self.broadcast(Message::new(MessageKey::EnoughPlayersToStart));
    }

    fn tick_starting(&mut self, live: &[PlayerId]) {
        if self.preferences.level_countdown {
            for player in live {
                self.hooks.world.set_level(*player, self.clock.get());
            }
        }

        let min_players = self.settings.min_players;
        if live.len() < min_players {
            self.clock.set(self.settings.lobby_waiting_time);
            self.set_state(ArenaState::WaitingForPlayers);
            self.broadcast(Message::new(MessageKey::MinimumPlayersRequired).arg(min_players));
            for player in live {
                self.hooks.world.reset_level(*player);
            }
            return;
        }

        let starting_time = self.settings.lobby_starting_time;
        if live.len() >= self.settings.max_players
            && self.clock.get() >= starting_time
            && !self.force_start
        {
            self.clock.set(starting_time);
            let remaining = self.clock.get();
            if ANNOUNCED_COUNTDOWN.contains(&remaining) || remaining <= 5 {
                self.broadcast(Message::new(MessageKey::StartingIn).arg(remaining));
            }
        }

        if self.clock.get() == 0 || self.force_start {
            self.begin_game(live);
            return;
        }

        self.clock.decrement();
    }

    fn begin_game(&mut self, live: &[PlayerId]) {
        self.set_state(ArenaState::InGame);
        self.events.publish(ArenaEvent::GameStarted {
            arena: self.id.clone(),
        });
        self.clock.set(self.settings.gameplay_time);
        self.teleport_all_to_start(live);

        let started = Message::new(MessageKey::GameStarted);
        for player in live {
            let player = *player;
            self.report(player, "update name tags", self.hooks.world.update_name_tags(player));
            if self.preferences.hide_players {
                self.report(player, "hide outsiders", self.hooks.world.hide_outsiders(player, live));
            }
            if let Some(user) = self.roster.get_mut(player) {
                user.reset_stats();
                user.add_stat(StatKind::GamesPlayed, 1);
            }
            self.report(
                player,
                "set game mode",
                self.hooks.world.set_game_mode(player, GameMode::Adventure),
            );
            self.hooks.notifier.send_message(player, &started);
            self.report(player, "give kit", self.hooks.kits.give_kit(player, &self.id));
        }

        if self.force_start {
            debug!(arena_id = %self.id, "force start consumed");
            self.force_start = false;
        }
    }

    fn tick_in_game(&mut self, live: &[PlayerId]) {
        let alive = self.alive_players().len();
        let remaining = self.clock.get();

        if alive < 2 || remaining <= 0 {
            info!(arena_id = %self.id, alive, remaining, "match over, stopping game");
            let referee = Arc::clone(&self.hooks.referee);
            referee.stop_game(self);
            return;
        }

        if ANNOUNCED_TIME_LEFT.contains(&remaining) {
            let title = Message::new(MessageKey::SecondsLeftTitle).arg(remaining);
            let subtitle = Message::new(MessageKey::SecondsLeftSubtitle).arg(remaining);
            for player in live {
                self.hooks.notifier.send_title(*player, &title, &subtitle);
            }
        }

        self.clock.decrement();
    }

    fn tick_ending(&mut self) {
        if self.clock.get() != 0 {
            self.clock.decrement();
            return;
        }

        self.hooks.display.stop_all(&self.id);
        self.hooks.display.remove_all(&self.id);

        let live = self.live_players();
        for player in &live {
            self.restore_player(*player, true);
        }

        if self.preferences.inventory_manager {
            for player in &live {
                self.report(*player, "load inventory", self.hooks.inventory.load_inventory(*player));
            }
        }

        if self.preferences.hand_off && self.preferences.shutdown_after_match {
            info!(arena_id = %self.id, "match cleaned up, shutting the server down");
            self.hooks.world.shutdown_server();
        }

        self.set_state(ArenaState::Restarting);
    }

    fn tick_restarting(&mut self) {
        let players = self.roster.ids();
        for user in self.roster.users_mut() {
            user.set_spectator(false);
        }
        self.roster.clear();

        self.events.publish(ArenaEvent::GameEnded {
            arena: self.id.clone(),
            players,
        });

        if self.preferences.hand_off {
            match self.hooks.hub.shuffle_next_arena() {
                Some(next) => {
                    for player in self.hooks.world.online_players() {
                        self.hooks.hub.join_attempt(player, &next);
                    }
                }
                None => warn!(arena_id = %self.id, "hand-off enabled but no arena to send players to"),
            }
        }

        self.set_state(ArenaState::WaitingForPlayers);
    }

    // -----------------------------------------------------------------------
    // Side effects
    // -----------------------------------------------------------------------

    fn broadcast(&self, message: Message) {
        self.roster
            .broadcast(&*self.hooks.world, &*self.hooks.notifier, &message);
    }

    fn report(&self, player: PlayerId, action: &'static str, result: HookResult) {
        if let Err(error) = result {
            warn!(arena_id = %self.id, %player, action, %error, "player side effect failed");
        }
    }

    fn show_players(&self, live: &[PlayerId]) {
        if !self.preferences.hide_players {
            return;
        }
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                self.hooks.world.show_to_each_other(*a, *b);
            }
        }
    }

    fn teleport_all_to_start(&mut self, live: &[PlayerId]) {
        match self.spawns.assign_all(live) {
            Ok(assignments) => {
                for (player, location) in &assignments {
                    self.report(
                        *player,
                        "teleport to spawn",
                        self.hooks.world.teleport(*player, location),
                    );
                }
            }
            Err(error) => {
                error!(arena_id = %self.id, %error, "cannot teleport players to start locations");
            }
        }
    }

    fn place_spectator(&mut self, player: PlayerId) {
        match self.spawns.assign_one() {
            Ok(location) => {
                self.report(player, "teleport to spawn", self.hooks.world.teleport(player, &location));
            }
            Err(error) => warn!(arena_id = %self.id, %player, %error, "cannot place spectator"),
        }
        self.report(
            player,
            "set game mode",
            self.hooks.world.set_game_mode(player, GameMode::Spectator),
        );
    }

    fn teleport_to_lobby(&self, player: PlayerId) {
        self.report(player, "reset movement", self.hooks.world.reset_movement(player));
        match &self.lobby_location {
            Some(lobby) => {
                self.report(player, "teleport to lobby", self.hooks.world.teleport(player, lobby));
            }
            None => warn!(arena_id = %self.id, %player, "lobby location isn't set"),
        }
    }

    fn teleport_to_end(&self, player: PlayerId) {
        if self.preferences.hand_off {
            self.report(player, "connect to hub", self.hooks.hub.connect_to_hub(player));
            return;
        }
        let location = match (&self.end_location, &self.lobby_location) {
            (Some(end), _) => end,
            (None, Some(lobby)) => {
                warn!(
                    arena_id = %self.id,
                    %player,
                    "end location isn't set, using the lobby location"
                );
                lobby
            }
            (None, None) => {
                warn!(arena_id = %self.id, %player, "neither end nor lobby location is set");
                return;
            }
        };
        self.report(player, "teleport to end", self.hooks.world.teleport(player, location));
    }

    /// Returns a player to their pre-match condition. `match_over` adds
    /// the end-of-game cooldown reset and reward.
    fn restore_player(&self, player: PlayerId, match_over: bool) {
        let world = &self.hooks.world;
        self.report(player, "show outsiders", world.show_outsiders(player));
        self.report(player, "set game mode", world.set_game_mode(player, GameMode::Survival));
        self.report(player, "reset movement", world.reset_movement(player));
        self.report(player, "clear inventory", world.clear_inventory(player));
        self.teleport_to_end(player);
        if match_over {
            self.report(player, "reset attack cooldown", world.reset_attack_cooldown(player));
            self.report(
                player,
                "end game reward",
                self.hooks.rewards.perform_reward(player, RewardType::EndGame),
            );
        }
        self.report(
            player,
            "restore scoreboard",
            self.hooks.display.restore_scoreboard(player),
        );
    }
}

impl Tickable for Arena {
    fn tick(&mut self) {
        Arena::tick(self);
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("timer", &self.clock.get())
            .field("players", &self.roster.len())
            .field("force_start", &self.force_start)
            .finish_non_exhaustive()
    }
}
