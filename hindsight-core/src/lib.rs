#![warn(missing_docs)]
//! Core components of a DQN-style reinforcement learning harness.
//!
//! * [`ring_buffer::RingBuffer`] keeps the last `k` frames of the running episode
//!   and serves the stacked state the model acts on.
//! * [`replay_buffer::ReplayBuffer`] stores transitions in a fixed-capacity
//!   circular store and samples batches of stacked states, zero-padding frames
//!   across episode boundaries.
//! * [`trainer::Trainer`] drives filling, stepping, learning and target
//!   synchronization against an [`Env`] and a [`QModel`].
//! * [`pg::PgTrainer`] is the policy-gradient counterpart built on whole episodes.
//!
//! Models, policies and environments are collaborators behind the traits of
//! this crate; no network or simulator is implemented here.
pub mod error;
pub mod evaluator;
pub mod explorer;
pub mod pg;
pub mod record;
pub mod replay_buffer;
pub mod ring_buffer;
pub mod schedule;
pub mod shape;
pub mod trainer;

mod base;
pub use base::{
    ActionId, Baseline, Env, ExperienceBufferBase, Info, Policy, QModel, ReplayBufferBase, Step,
    Transition,
};

#[cfg(test)]
mod dummy;
