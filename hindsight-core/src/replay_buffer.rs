//! Fixed-capacity circular replay buffer with stacked histories.
//!
//! The buffer stores raw observations once, in insertion order, and rebuilds
//! the `k`-frame state of a sample from the neighbouring slots at sampling
//! time. Overlapping histories therefore never duplicate frames in memory.
//!
//! The rules deciding which slots may be drawn and which frames of a history
//! are zero-padded live in [`window`] as pure functions of the buffer geometry
//! and the `done` flags.
mod base;
mod batch;
mod config;
pub mod window;
pub use base::ReplayBuffer;
pub use batch::TransitionBatch;
pub use config::{ReplayBufferConfig, SamplingPolicy};
