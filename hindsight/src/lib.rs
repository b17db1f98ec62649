#![warn(missing_docs)]
//! Experience replay and training-loop harness for reinforcement learning.
//!
//! This crate re-exports [`hindsight_core`] and adds collaborators that need
//! no deep learning backend:
//!
//! * [`corridor::Corridor`], a one-dimensional walk to a goal cell.
//! * [`linear::LinearQ`], a linear action-value function for the DQN trainer.
//! * [`linear::LinearSoftmax`], a linear softmax policy for the policy-gradient trainer.
//!
//! [`run`] wires them into complete runs, used by the `hindsight` binary.
pub mod corridor;
pub mod linear;
pub mod run;
pub use hindsight_core::*;
