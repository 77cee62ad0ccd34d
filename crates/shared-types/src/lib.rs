//! # Shared Types Crate
//!
//! Types shared by the shard announcer and the node runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: block uids, node identities and registry
//!   timestamps are defined once, here.
//! - **Injected Time**: anything that stamps or checks an expiration takes a
//!   `TimeSource` rather than reading the wall clock directly.
//! - **Signals, not flags**: cross-thread readiness and stop requests use
//!   `Signal`, which supports timed waits with broadcast wake-up.

pub mod entities;
pub mod signal;
pub mod time;

pub use entities::*;
pub use signal::Signal;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
