//! Time sources for replay.
//!
//! Replay blocks in real time through [`ThreadSleeper`]. Tests and trace
//! collection use [`VirtualClock`], which only advances a counter.

use std::thread;
use std::time::Duration;

/// Blocks the replay between acts.
pub trait Sleeper {
    /// Wait for `duration` before the next act is dispatched.
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// A virtual clock that records requested waits without blocking.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    /// Total virtual time elapsed.
    position: Duration,
    /// Every wait requested, in order.
    waits: Vec<Duration>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current virtual time position.
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Waits requested so far.
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// Reset the clock to zero and forget recorded waits.
    pub fn reset(&mut self) {
        self.position = Duration::ZERO;
        self.waits.clear();
    }
}

impl Sleeper for VirtualClock {
    fn sleep(&mut self, duration: Duration) {
        self.position = self.position.saturating_add(duration);
        self.waits.push(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}
