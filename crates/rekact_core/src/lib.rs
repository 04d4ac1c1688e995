//! ReKact core
//!
//! Parses keyboard act strings ("kacts"), optionally wrapped in a sensor
//! payload, and replays them with their recorded timing.
//!
//! - [`validate`] splits an act string into [`KeyAct`]s, all or nothing
//! - [`Kact`] owns the parsed acts, their stats and the replay entry points
//! - [`replay`] correlates KeyDown/KeyPress/KeyUp through two queues and
//!   notifies registered handlers per act
//!
//! # Example
//!
//! ```
//! use rekact_core::Kact;
//!
//! let mut kact = Kact::new(Some("1,1,-2,0,abc,0,0;1,3,-2,0,abc,0,0;1,2,-2,0,abc,0,0"));
//! assert!(kact.is_valid());
//!
//! kact.on_key_press(|notice| assert!(notice.act.char().is_some()));
//! kact.play(true);
//! ```

mod act;
mod config;
mod error;
mod kact;
mod key;
mod shared;
mod source;
mod stats;

pub mod replay;
pub mod sensor;

pub use act::{KeyAct, MAX_TOKENS, MIN_TOKENS};
pub use config::ReplayConfig;
pub use error::{KactError, Result};
pub use kact::{is_valid_kact, validate, Kact};
pub use key::{ActKind, KeyCode, KeyLocation, Modifiers};
pub use shared::SharedKact;
pub use source::KactSource;
pub use stats::{KactSummary, Leftovers};
