//! Replay engine for parsed kacts.
//!
//! This module provides:
//! - `ReplaySession` - Per-replay queues and KeyDown/KeyPress/KeyUp correlation
//! - `ReplayDispatcher` - Synchronous notification delivery
//! - `Sleeper` - Pluggable blocking between acts (`ThreadSleeper`, `VirtualClock`)
//!
//! # Example
//!
//! ```ignore
//! use rekact_core::Kact;
//!
//! let mut kact = Kact::new(Some(raw));
//! kact.on_key_press(|notice| println!("{:?}", notice.act.char()));
//! kact.play(false);
//! ```

mod clock;
mod notify;
mod session;

pub use clock::{Sleeper, ThreadSleeper, VirtualClock};
pub use notify::{
    ActHandler, ActNotice, ActSnapshot, EventHandler, QueueView, ReplayDispatcher, ReplayEvent,
    ReplayTrace, WaitHandler, WaitNotice,
};
pub use session::{wait_before, ReplaySession};
