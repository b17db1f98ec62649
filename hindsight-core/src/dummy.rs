//! Scripted collaborators for tests.
use crate::{
    base::{ActionId, Baseline, Env, Policy, QModel, Step},
    pg::PgBatch,
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    ring_buffer::StackedState,
    shape::{Observation, Shape},
};
use anyhow::Result;

/// Episodes of fixed length emitting observations `1.0, 2.0, ...` and reward 1.
#[derive(Debug, Clone)]
pub struct DummyEnv {
    episode_len: usize,
    t: usize,
    pub n_sampled: usize,
    pub n_resets: usize,
    pub n_renders: usize,
}

impl DummyEnv {
    pub fn new(episode_len: usize) -> Self {
        Self {
            episode_len,
            t: 0,
            n_sampled: 0,
            n_resets: 0,
            n_renders: 0,
        }
    }

    fn obs(&self) -> Observation<f32> {
        Observation::new(Shape::new(vec![1]).unwrap(), vec![self.t as f32 + 1.0]).unwrap()
    }
}

impl Env for DummyEnv {
    type Elem = f32;
    type Info = ();

    fn obs_shape(&self) -> Shape {
        Shape::new(vec![1]).unwrap()
    }

    fn reset(&mut self) -> Result<Observation<f32>> {
        self.t = 0;
        self.n_resets += 1;
        Ok(self.obs())
    }

    fn step(&mut self, _a: ActionId) -> Result<Step<Self>> {
        self.t += 1;
        let is_done = self.t >= self.episode_len;
        Ok(Step::new(self.obs(), 1.0, is_done, ()))
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn sample_action(&mut self) -> ActionId {
        self.n_sampled += 1;
        self.n_sampled % 2
    }

    fn render(&mut self) -> Result<()> {
        self.n_renders += 1;
        Ok(())
    }
}

/// Q model with fixed values that counts its calls.
#[derive(Debug, Default)]
pub struct CountingModel {
    n_actions: usize,
    pub n_predict: usize,
    pub n_train: usize,
    pub n_sync: usize,
    pub learning_rates: Vec<f64>,
    pub batch_sizes: Vec<usize>,
}

impl CountingModel {
    pub fn new(n_actions: usize) -> Self {
        Self {
            n_actions,
            ..Default::default()
        }
    }
}

impl QModel<f32> for CountingModel {
    fn predict(&mut self, _state: &StackedState<'_, f32>) -> Result<Vec<f64>> {
        self.n_predict += 1;
        Ok((0..self.n_actions).map(|a| a as f64).collect())
    }

    fn train(&mut self, batch: &TransitionBatch<f32>, learning_rate: f64) -> Result<Record> {
        self.n_train += 1;
        self.learning_rates.push(learning_rate);
        self.batch_sizes.push(batch.len());
        Ok(Record::from_scalar("loss", 0.0))
    }

    fn update_target_net(&mut self) -> Result<()> {
        self.n_sync += 1;
        Ok(())
    }
}

/// Policy always taking action 0 that keeps the batches it was fitted on.
#[derive(Debug, Default)]
pub struct DummyPolicy {
    pub batch_sizes: Vec<usize>,
    pub last_advantages: Vec<f64>,
    pub learning_rates: Vec<f64>,
}

impl Policy<f32> for DummyPolicy {
    fn select_action(&mut self, _state: &StackedState<'_, f32>) -> Result<ActionId> {
        Ok(0)
    }

    fn fit(&mut self, batch: &PgBatch<f32>, learning_rate: f64) -> Result<Record> {
        self.batch_sizes.push(batch.len());
        self.learning_rates.push(learning_rate);
        self.last_advantages = batch.advantages.clone();
        Ok(Record::from_slice(&[("policy_loss", RecordValue::Scalar(0.0))]))
    }
}

/// Baseline predicting the same value for every state.
pub struct ConstantBaseline(pub f64);

impl Baseline<f32> for ConstantBaseline {
    fn compute_baseline(&mut self, _states: &[f32], n: usize) -> Result<Vec<f64>> {
        Ok(vec![self.0; n])
    }
}
