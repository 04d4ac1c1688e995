//! Thread-safe kact handle.
//!
//! A replay mutates its kact, so concurrent replays of one instance are
//! serialized behind a lock. Useful for running a replay on a worker thread
//! while another thread registers handlers or reads diagnostics.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::ReplayConfig;
use crate::kact::Kact;
use crate::replay::Sleeper;

/// Shared, lock-protected [`Kact`].
#[derive(Clone, Debug)]
pub struct SharedKact {
    inner: Arc<Mutex<Kact>>,
}

impl SharedKact {
    pub fn new(kact: Kact) -> Self {
        Self {
            inner: Arc::new(Mutex::new(kact)),
        }
    }

    /// Replay in real time, holding the lock for the whole replay.
    pub fn play(&self, skip_wait: bool) {
        self.inner.lock().play(skip_wait);
    }

    /// Replay with an explicit config and time source.
    pub fn play_with(&self, config: &ReplayConfig, sleeper: &mut dyn Sleeper) {
        self.inner.lock().play_with(config, sleeper);
    }

    /// Run `f` with exclusive access to the kact.
    pub fn with<R>(&self, f: impl FnOnce(&mut Kact) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Check if no replay is currently holding the kact.
    pub fn is_idle(&self) -> bool {
        !self.inner.is_locked()
    }
}

impl From<Kact> for SharedKact {
    fn from(kact: Kact) -> Self {
        Self::new(kact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_replay_on_worker_thread() {
        let shared = SharedKact::new(Kact::new(Some(
            "0,1,-2,0,a,0,0;1,3,-2,0,a,0,0;2,2,-2,0,a,0,0",
        )));

        let worker = shared.clone();
        thread::spawn(move || worker.play(true)).join().unwrap();

        assert!(shared.is_idle());
        let clean = shared.with(|kact| kact.leftover_counts().is_clean());
        assert!(clean);
    }

    #[test]
    fn test_concurrent_replays_are_serialized() {
        let shared = SharedKact::new(Kact::new(Some("0,1,65,0,a,0,0;1,2,65,0,a,0,0")));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let worker = shared.clone();
                thread::spawn(move || worker.play(true))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let up_len = shared.with(|kact| kact.up_queue().map(|q| q.len()));
        assert_eq!(up_len, Some(0));
    }
}
