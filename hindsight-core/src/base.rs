//! Core functionalities.
mod env;
mod model;
mod policy;
mod replay_buffer;
mod step;
pub use env::Env;
pub use model::QModel;
pub use policy::{Baseline, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use step::{Info, Step, Transition};

/// Index of a discrete action.
pub type ActionId = usize;
