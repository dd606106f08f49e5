//! # timing-adapters
//!
//! Clock and timer implementations for the `Clock` and `TickScheduler` ports.

pub mod clock;
pub mod scheduler;

pub use clock::{ManualClock, SystemClock};
pub use scheduler::{ManualTickScheduler, TokioTickScheduler};
