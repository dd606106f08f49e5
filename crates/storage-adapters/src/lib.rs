//! # storage-adapters
//!
//! In-memory implementations of the story and user repositories, with
//! simulated latency and optional bundled fixtures.

pub mod latency;
pub mod memory;

#[cfg(feature = "fixtures")]
pub mod fixtures;

pub use latency::SimulatedLatency;
pub use memory::{InMemoryStoryRepo, InMemoryUserRepo};
