//! A one-dimensional corridor.
use anyhow::{bail, Result};
use hindsight_core::{
    shape::{Observation, Shape},
    ActionId, Env, Step,
};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration of [`Corridor`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CorridorConfig {
    /// Number of cells. The agent starts in the leftmost, the goal is the rightmost.
    pub length: usize,

    /// Episodes are truncated after this many steps.
    pub max_steps: usize,

    /// Reward of every step that does not reach the goal, negated.
    pub step_penalty: f64,

    /// Seed of the random action sampler.
    pub seed: u64,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            length: 8,
            max_steps: 100,
            step_penalty: 0.01,
            seed: 42,
        }
    }
}

impl CorridorConfig {
    /// Sets the number of cells.
    pub fn length(mut self, v: usize) -> Self {
        self.length = v;
        self
    }

    /// Sets the episode step limit.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }
}

/// Walk left (action 0) or right (action 1) until the goal cell.
///
/// Observations are one-hot encodings of the position. Reaching the goal
/// yields reward 1, any other step `-step_penalty`.
pub struct Corridor {
    config: CorridorConfig,
    shape: Shape,
    pos: usize,
    t: usize,
    rng: StdRng,
}

impl Corridor {
    /// Constructs the environment.
    pub fn build(config: &CorridorConfig) -> Result<Self> {
        if config.length < 2 {
            bail!("corridor needs at least 2 cells, got {}", config.length);
        }
        if config.max_steps == 0 {
            bail!("max_steps must be positive");
        }
        Ok(Self {
            config: config.clone(),
            shape: Shape::new(vec![config.length])?,
            pos: 0,
            t: 0,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Current cell.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn obs(&self) -> Result<Observation<f32>> {
        let mut data = vec![0f32; self.config.length];
        data[self.pos] = 1.0;
        Ok(Observation::new(self.shape.clone(), data)?)
    }
}

impl Env for Corridor {
    type Elem = f32;
    type Info = ();

    fn obs_shape(&self) -> Shape {
        self.shape.clone()
    }

    fn reset(&mut self) -> Result<Observation<f32>> {
        self.pos = 0;
        self.t = 0;
        self.obs()
    }

    fn step(&mut self, a: ActionId) -> Result<Step<Self>> {
        match a {
            0 => self.pos = self.pos.saturating_sub(1),
            1 => self.pos = (self.pos + 1).min(self.config.length - 1),
            _ => bail!("invalid action {}", a),
        }
        self.t += 1;

        let reached = self.pos == self.config.length - 1;
        let reward = if reached { 1.0 } else { -self.config.step_penalty };
        let is_done = reached || self.t >= self.config.max_steps;
        Ok(Step::new(self.obs()?, reward, is_done, ()))
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn sample_action(&mut self) -> ActionId {
        self.rng.gen_range(0..2)
    }

    fn render(&mut self) -> Result<()> {
        let cells: String = (0..self.config.length)
            .map(|i| match i {
                _ if i == self.pos => 'A',
                _ if i == self.config.length - 1 => 'G',
                _ => '.',
            })
            .collect();
        info!("[{}] t = {}", cells, self.t);
        Ok(())
    }
}
