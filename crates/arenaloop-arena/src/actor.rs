//! Arena actor: a Tokio task that owns one [`Arena`].
//!
//! The actor is the single owner of the roster, the clock and the state.
//! Joins, leaves and operator commands arrive on an mpsc channel and
//! ticks come from the arena's [`TickScheduler`], both inside one
//! `select!` loop, so a tick always runs to completion before the next
//! command or tick is looked at.

use arenaloop_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{Arena, ArenaError, ArenaId, ArenaInfo, PlayerId, StatKind};

/// Commands sent to an arena actor through its channel.
///
/// Variants with a `reply` carry a oneshot sender the actor answers on.
pub(crate) enum ArenaCommand {
    /// Arm the tick loop (first call only).
    Start {
        reply: oneshot::Sender<Result<(), ArenaError>>,
    },

    /// Deschedule future ticks. The actor keeps serving commands.
    Stop,

    Join {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), ArenaError>>,
    },

    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), ArenaError>>,
    },

    SetSpectator {
        player: PlayerId,
        spectator: bool,
        reply: oneshot::Sender<Result<(), ArenaError>>,
    },

    AddStat {
        player: PlayerId,
        kind: StatKind,
        delta: i32,
        reply: oneshot::Sender<Result<i32, ArenaError>>,
    },

    ForceStart {
        reply: oneshot::Sender<Result<(), ArenaError>>,
    },

    GetInfo {
        reply: oneshot::Sender<ArenaInfo>,
    },

    /// Every member id, disconnected ones included.
    Members {
        reply: oneshot::Sender<Vec<PlayerId>>,
    },

    /// End the actor task.
    Shutdown,
}

/// Handle to a running arena actor.
///
/// Cheap to clone; it's an `mpsc::Sender` plus the arena id.
#[derive(Clone)]
pub struct ArenaHandle {
    arena_id: ArenaId,
    sender: mpsc::Sender<ArenaCommand>,
}

impl ArenaHandle {
    pub fn arena_id(&self) -> &ArenaId {
        &self.arena_id
    }

    /// Arms the arena's tick loop. Fails if it was armed before.
    pub async fn start(&self) -> Result<(), ArenaError> {
        self.request(|reply| ArenaCommand::Start { reply }).await?
    }

    /// Stops future ticks. Ticks do not resume afterwards.
    pub async fn stop(&self) -> Result<(), ArenaError> {
        self.send(ArenaCommand::Stop).await
    }

    pub async fn join(&self, player: PlayerId) -> Result<(), ArenaError> {
        self.request(|reply| ArenaCommand::Join { player, reply })
            .await?
    }

    pub async fn leave(&self, player: PlayerId) -> Result<(), ArenaError> {
        self.request(|reply| ArenaCommand::Leave { player, reply })
            .await?
    }

    pub async fn set_spectator(&self, player: PlayerId, spectator: bool) -> Result<(), ArenaError> {
        self.request(|reply| ArenaCommand::SetSpectator {
            player,
            spectator,
            reply,
        })
        .await?
    }

    /// Adds to a member's statistic; resolves to the new value.
    pub async fn add_stat(&self, player: PlayerId, kind: StatKind, delta: i32) -> Result<i32, ArenaError> {
        self.request(|reply| ArenaCommand::AddStat {
            player,
            kind,
            delta,
            reply,
        })
        .await?
    }

    pub async fn force_start(&self) -> Result<(), ArenaError> {
        self.request(|reply| ArenaCommand::ForceStart { reply }).await?
    }

    pub async fn info(&self) -> Result<ArenaInfo, ArenaError> {
        self.request(|reply| ArenaCommand::GetInfo { reply }).await
    }

    /// Ids of everyone on the roster, spectators and disconnected
    /// members included.
    pub async fn members(&self) -> Result<Vec<PlayerId>, ArenaError> {
        self.request(|reply| ArenaCommand::Members { reply }).await
    }

    /// Ends the actor task.
    pub async fn shutdown(&self) -> Result<(), ArenaError> {
        self.send(ArenaCommand::Shutdown).await
    }

    async fn send(&self, cmd: ArenaCommand) -> Result<(), ArenaError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id.clone()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ArenaCommand,
    ) -> Result<T, ArenaError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id.clone()))
    }
}

/// The actor state. Runs inside a Tokio task.
struct ArenaActor {
    arena: Arena,
    scheduler: TickScheduler,
    receiver: mpsc::Receiver<ArenaCommand>,
}

impl ArenaActor {
    async fn run(mut self) {
        tracing::info!(arena_id = %self.arena.id(), "arena actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                _ = self.scheduler.drive(&mut self.arena) => {}
            }
        }

        tracing::info!(arena_id = %self.arena.id(), "arena actor stopped");
    }

    /// Applies one command. Returns `false` when the actor should exit.
    fn handle(&mut self, cmd: ArenaCommand) -> bool {
        match cmd {
            ArenaCommand::Start { reply } => {
                let result = if self.arena.start() {
                    self.scheduler.resume();
                    Ok(())
                } else {
                    Err(ArenaError::AlreadyStarted(self.arena.id().clone()))
                };
                let _ = reply.send(result);
            }
            ArenaCommand::Stop => {
                tracing::info!(arena_id = %self.arena.id(), "arena ticks stopped");
                self.scheduler.pause();
            }
            ArenaCommand::Join { player, reply } => {
                let _ = reply.send(self.arena.join(player));
            }
            ArenaCommand::Leave { player, reply } => {
                let _ = reply.send(self.arena.leave(player).map(|_| ()));
            }
            ArenaCommand::SetSpectator {
                player,
                spectator,
                reply,
            } => {
                let _ = reply.send(self.arena.set_spectator(player, spectator));
            }
            ArenaCommand::AddStat {
                player,
                kind,
                delta,
                reply,
            } => {
                let _ = reply.send(self.arena.add_stat(player, kind, delta));
            }
            ArenaCommand::ForceStart { reply } => {
                let _ = reply.send(self.arena.force_start());
            }
            ArenaCommand::GetInfo { reply } => {
                let _ = reply.send(self.arena.info());
            }
            ArenaCommand::Members { reply } => {
                let _ = reply.send(self.arena.roster().ids());
            }
            ArenaCommand::Shutdown => {
                tracing::info!(arena_id = %self.arena.id(), "arena shutting down");
                return false;
            }
        }
        true
    }
}

/// Spawns an actor owning `arena` and returns a handle to it.
///
/// The tick loop stays paused until [`ArenaHandle::start`] is called.
/// `channel_size` bounds the command queue.
pub fn spawn_arena(arena: Arena, tick: TickConfig, channel_size: usize) -> ArenaHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let arena_id = arena.id().clone();

    let actor = ArenaActor {
        arena,
        scheduler: TickScheduler::new(TickConfig {
            start_paused: true,
            ..tick
        }),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    ArenaHandle {
        arena_id,
        sender: tx,
    }
}
