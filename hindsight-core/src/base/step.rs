//! Environment step.
use super::{ActionId, Env};
use crate::shape::{Element, Observation};

/// Additional information to observation and reward.
pub trait Info {}

impl Info for () {}

/// Represents an observation and reward tuple `(o_t+1, r_t, done_t)`
/// with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
pub struct Step<E: Env> {
    /// Observation after the step.
    pub obs: Observation<E::Elem>,

    /// Reward.
    pub reward: f64,

    /// Flag denoting if the episode ended with this step.
    pub is_done: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(obs: Observation<E::Elem>, reward: f64, is_done: bool, info: E::Info) -> Self {
        Step {
            obs,
            reward,
            is_done,
            info,
        }
    }
}

/// One transition `(o_t, a_t, r_t, done_t)` as stored in a replay buffer.
///
/// `o_t+1` is not stored: it is the observation of the next slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T: Element> {
    /// Observation `o_t`.
    pub obs: Observation<T>,

    /// Action `a_t`.
    pub act: ActionId,

    /// Reward `r_t`.
    pub reward: f64,

    /// Whether `o_t` was the last observation of its episode.
    pub is_done: bool,
}
