//! Environment.
use super::{ActionId, Info, Step};
use crate::shape::{Element, Observation, Shape};
use anyhow::Result;

/// Represents an environment, typically an MDP, with a discrete action space.
///
/// Errors raised by an environment are propagated unchanged by the trainers.
pub trait Env {
    /// Element type of observations.
    type Elem: Element;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Shape of the observations emitted by the environment.
    fn obs_shape(&self) -> Shape;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Observation<Self::Elem>>;

    /// Performs an environment step.
    fn step(&mut self, a: ActionId) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Number of discrete actions, `action_space.n`.
    fn n_actions(&self) -> usize;

    /// Draws a uniformly random action, `action_space.sample()`.
    fn sample_action(&mut self) -> ActionId;

    /// Renders the current state. Does nothing by default.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }
}
