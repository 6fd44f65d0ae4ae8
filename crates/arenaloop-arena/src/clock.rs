//! The arena countdown.

/// Tick-counted countdown owned by the arena state machine.
///
/// The meaning of the value depends on the arena state (lobby countdown,
/// remaining match time, ending grace period). Every state checks for
/// zero before decrementing, so [`decrement`](Self::decrement) never has
/// to go below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownClock {
    value: i32,
}

impl CountdownClock {
    pub fn new(value: i32) -> Self {
        Self { value }
    }

    pub fn get(&self) -> i32 {
        self.value
    }

    pub fn set(&mut self, value: i32) {
        self.value = value;
    }

    /// Count down one tick. Stays at zero once there.
    pub fn decrement(&mut self) {
        if self.value > 0 {
            self.value -= 1;
        }
    }

    /// `true` once the countdown has run out.
    pub fn is_expired(&self) -> bool {
        self.value <= 0
    }
}
