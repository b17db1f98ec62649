//! Default implementation of the [`Evaluator`] trait.
//!
//! This module provides a simple evaluator that runs a fixed number of episodes
//! with a near-greedy policy and calculates the average return across all episodes.
use super::Evaluator;
use crate::{
    base::{Env, QModel},
    explorer::EpsilonGreedy,
    record::{Record, RecordValue},
    ring_buffer::RingBuffer,
    schedule::Schedule,
};
use anyhow::Result;
use log::info;
use rand::{rngs::StdRng, SeedableRng};

/// A default implementation of the [`Evaluator`] trait.
///
/// Actions are taken epsilon-greedily with a small constant exploration rate,
/// 0.01 unless set with [`DefaultEvaluator::epsilon`]. The frame history is
/// kept in an own [`RingBuffer`], reset at the start of every episode.
///
/// # Examples
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::new(env, 4, 10, 42)?.render(true);
/// let record = evaluator.evaluate(&mut model)?;
/// println!("Average return: {}", record.get_scalar("episode_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// The environment instance used for evaluation.
    env: E,

    history: RingBuffer<E::Elem>,
    explorer: EpsilonGreedy,
    render: bool,
    rng: StdRng,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// # Arguments
    ///
    /// * `env` - Environment for evaluation
    /// * `history_length` - Number of stacked frames, as in training
    /// * `n_episodes` - Number of episodes to run during evaluation
    /// * `seed` - Seed of the exploration RNG
    pub fn new(env: E, history_length: usize, n_episodes: usize, seed: u64) -> Result<Self> {
        let history = RingBuffer::new(env.obs_shape(), history_length)?;
        Ok(Self {
            n_episodes,
            env,
            history,
            explorer: EpsilonGreedy::new(Schedule::Constant(0.01)),
            render: false,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Sets the exploration rate.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.explorer = EpsilonGreedy::new(Schedule::Constant(v));
        self
    }

    /// Renders the environment at every step if `true`.
    pub fn render(mut self, v: bool) -> Self {
        self.render = v;
        self
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Plays one episode and returns its undiscounted return.
    pub fn play_one_episode<M: QModel<E::Elem>>(&mut self, model: &mut M) -> Result<f64> {
        self.history.reset();
        let mut obs = self.env.reset()?;
        let mut r_total = 0.0;

        loop {
            if self.render {
                self.env.render()?;
            }
            self.history.append(&obs)?;
            let act = self.explorer.action(
                0,
                &self.history.get_stack(),
                &mut self.env,
                &mut *model,
                &mut self.rng,
            )?;
            let step = self.env.step(act)?;
            r_total += step.reward;
            if step.is_done {
                return Ok(r_total);
            }
            obs = step.obs;
        }
    }
}

impl<E: Env, M: QModel<E::Elem>> Evaluator<E, M> for DefaultEvaluator<E> {
    /// Runs `n_episodes` episodes and records the mean return as
    /// `"episode_return"` along with the per-episode returns.
    fn evaluate(&mut self, model: &mut M) -> Result<Record> {
        let mut returns = Vec::with_capacity(self.n_episodes);
        for ix in 0..self.n_episodes {
            let r = self.play_one_episode(&mut *model)?;
            info!("Evaluation episode {}: return = {}", ix, r);
            returns.push(r);
        }

        let mean = returns.iter().sum::<f64>() / self.n_episodes.max(1) as f64;
        let mut record = Record::from_scalar("episode_return", mean);
        record.insert("episode_returns", RecordValue::Array1(returns));
        Ok(record)
    }
}
