//! Environment stepping with frame history.
use crate::{
    base::{ActionId, Env, ExperienceBufferBase, Transition},
    ring_buffer::{RingBuffer, StackedState},
    shape::Observation,
};
use anyhow::Result;
use log::trace;

/// Reward and termination of a single environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Reward of the step.
    pub reward: f64,

    /// Whether the step ended the episode.
    pub is_done: bool,
}

/// Interacts with an environment and pushes transitions into a buffer.
///
/// The sampler owns the environment, the pending observation `o_t` and the
/// [`RingBuffer`] holding the recent frames of the current episode. On every
/// call of [`Sampler::sample_and_push`]:
///
/// 1. `o_t` is appended to the ring buffer and the stacked state is taken.
/// 2. An action `a_t` is chosen from the stacked state.
/// 3. The environment is stepped with `a_t`.
/// 4. `(o_t, a_t, r_t, done_t)` is pushed into the buffer.
/// 5. If the episode ended, the ring buffer and then the environment are
///    reset, and the first observation of the new episode becomes pending.
pub struct Sampler<E: Env> {
    env: E,
    prev_obs: Option<Observation<E::Elem>>,
    history: RingBuffer<E::Elem>,
}

impl<E: Env> Sampler<E> {
    /// Creates a sampler stacking `history_length` frames.
    pub fn new(env: E, history_length: usize) -> Result<Self> {
        let history = RingBuffer::new(env.obs_shape(), history_length)?;
        Ok(Self {
            env,
            prev_obs: None,
            history,
        })
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Mutable reference to the environment.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Consumes the sampler and returns the environment.
    pub fn into_env(self) -> E {
        self.env
    }

    /// Performs an environment step and pushes the transition into `buffer`.
    ///
    /// `select` receives the stacked state of `o_t` and the environment, the
    /// latter for sampling random actions.
    pub fn sample_and_push<R, F>(&mut self, buffer: &mut R, mut select: F) -> Result<StepOutcome>
    where
        R: ExperienceBufferBase<Item = Transition<E::Elem>>,
        F: FnMut(&StackedState<'_, E::Elem>, &mut E) -> Result<ActionId>,
    {
        let obs = match self.prev_obs.take() {
            Some(obs) => obs,
            None => {
                self.history.reset();
                self.env.reset()?
            }
        };

        self.history.append(&obs)?;
        let act = select(&self.history.get_stack(), &mut self.env)?;
        let step = self.env.step(act)?;
        trace!("act = {}, reward = {}, done = {}", act, step.reward, step.is_done);

        let outcome = StepOutcome {
            reward: step.reward,
            is_done: step.is_done,
        };
        buffer.push(Transition {
            obs,
            act,
            reward: step.reward,
            is_done: step.is_done,
        })?;

        self.prev_obs = if step.is_done {
            self.history.reset();
            Some(self.env.reset()?)
        } else {
            Some(step.obs)
        };

        Ok(outcome)
    }
}
