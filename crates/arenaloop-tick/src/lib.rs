//! Fixed-interval tick scheduler for arena lifecycles.
//!
//! Every arena runs one scheduler inside its actor task. A tick is one
//! unit of game time (one second by default); all countdowns in the
//! arena are expressed in ticks, never in wall-clock deadlines.
//!
//! # Integration
//!
//! The scheduler sits inside an arena actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, leave, force start */ }
//!         _ = scheduler.drive(&mut arena) => {}
//!     }
//! }
//! ```
//!
//! A scheduler can be created paused: `wait_for_tick` then pends until
//! [`TickScheduler::resume`] is called. Arenas use this to arm their tick
//! loop only on an explicit start.

mod config;
mod scheduler;

pub use config::{TickConfig, TickPolicy};
pub use scheduler::{TickInfo, TickMetrics, TickScheduler, Tickable};
