//! Linear function approximators over stacked states.
//!
//! Both models flatten the stacked state into a feature vector `x` and compute
//! one score per action, `W x + b`. They implement the collaborator traits of
//! `hindsight-core` without any deep learning backend.
use anyhow::{ensure, Result};
use hindsight_core::{
    pg::PgBatch,
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    ring_buffer::StackedState,
    shape::Element,
    ActionId, Policy, QModel,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct Linear {
    /// Row-major `[out_dim, in_dim]`.
    w: Vec<f64>,
    b: Vec<f64>,
    in_dim: usize,
}

impl Linear {
    fn new(in_dim: usize, out_dim: usize, init_scale: f64, rng: &mut StdRng) -> Self {
        let w = (0..in_dim * out_dim)
            .map(|_| init_scale * (2.0 * rng.gen::<f64>() - 1.0))
            .collect();
        Self {
            w,
            b: vec![0.0; out_dim],
            in_dim,
        }
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        self.b
            .iter()
            .enumerate()
            .map(|(o, b)| {
                let row = &self.w[o * self.in_dim..(o + 1) * self.in_dim];
                b + row.iter().zip(x).map(|(w, x)| w * x).sum::<f64>()
            })
            .collect()
    }

    /// `W[o] += scale * x`, `b[o] += scale`.
    fn add_scaled(&mut self, o: usize, x: &[f64], scale: f64) {
        let row = &mut self.w[o * self.in_dim..(o + 1) * self.in_dim];
        row.iter_mut().zip(x).for_each(|(w, x)| *w += scale * x);
        self.b[o] += scale;
    }
}

fn features<T: Element + Into<f64>>(data: &[T], in_dim: usize) -> Result<Vec<f64>> {
    ensure!(
        data.len() == in_dim,
        "expected a state of {} elements, got {}",
        in_dim,
        data.len()
    );
    Ok(data.iter().map(|&v| v.into()).collect())
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let m = max(logits);
    let exp: Vec<f64> = logits.iter().map(|l| (l - m).exp()).collect();
    let z: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / z).collect()
}

/// Configuration of [`LinearQ`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinearQConfig {
    /// Discount factor.
    pub gamma: f64,

    /// Initial weights are drawn from `[-init_scale, init_scale]`.
    pub init_scale: f64,

    /// Seed of weight initialization.
    pub seed: u64,
}

impl Default for LinearQConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            init_scale: 0.01,
            seed: 42,
        }
    }
}

/// Linear action-value function with a target copy.
///
/// [`QModel::train`] performs one step of semi-gradient Q-learning on the
/// batch, regressing `Q(s, a)` towards `r + gamma * (1 - done) * max_a' Q_tgt(s', a')`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LinearQ {
    q: Linear,
    q_tgt: Linear,
    gamma: f64,
}

impl LinearQ {
    /// Constructs a model for states of `in_dim` elements and `n_actions` actions.
    pub fn build(config: &LinearQConfig, in_dim: usize, n_actions: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let q = Linear::new(in_dim, n_actions, config.init_scale, &mut rng);
        Self {
            q_tgt: q.clone(),
            q,
            gamma: config.gamma,
        }
    }
}

impl<T: Element + Into<f64>> QModel<T> for LinearQ {
    fn predict(&mut self, state: &StackedState<'_, T>) -> Result<Vec<f64>> {
        let x = features(&state.to_vec(), self.q.in_dim)?;
        Ok(self.q.forward(&x))
    }

    fn train(&mut self, batch: &TransitionBatch<T>, learning_rate: f64) -> Result<Record> {
        let n = batch.len();
        if n == 0 {
            return Ok(Record::empty());
        }

        let mut grad = Linear {
            w: vec![0.0; self.q.w.len()],
            b: vec![0.0; self.q.b.len()],
            in_dim: self.q.in_dim,
        };
        let mut loss = 0.0;
        let mut q_sum = 0.0;

        for i in 0..n {
            let x = features(batch.state(i), self.q.in_dim)?;
            let x_next = features(batch.next_state(i), self.q.in_dim)?;
            let a = batch.act[i];
            ensure!(a < self.q.b.len(), "invalid action {} in batch", a);

            let q = self.q.forward(&x)[a];
            let not_done = if batch.is_done[i] { 0.0 } else { 1.0 };
            let q_next = max(&self.q_tgt.forward(&x_next));
            let target = batch.reward[i] + self.gamma * not_done * q_next;
            let td = target - q;

            grad.add_scaled(a, &x, td);
            loss += 0.5 * td * td;
            q_sum += q;
        }

        let scale = learning_rate / n as f64;
        self.q.w.iter_mut().zip(&grad.w).for_each(|(w, g)| *w += scale * g);
        self.q.b.iter_mut().zip(&grad.b).for_each(|(b, g)| *b += scale * g);

        Ok(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss / n as f64)),
            ("q_mean", RecordValue::Scalar(q_sum / n as f64)),
        ]))
    }

    fn update_target_net(&mut self) -> Result<()> {
        self.q_tgt = self.q.clone();
        Ok(())
    }
}

/// Configuration of [`LinearSoftmax`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinearSoftmaxConfig {
    /// Initial weights are drawn from `[-init_scale, init_scale]`.
    pub init_scale: f64,

    /// Seed of weight initialization and action sampling.
    pub seed: u64,
}

impl Default for LinearSoftmaxConfig {
    fn default() -> Self {
        Self {
            init_scale: 0.01,
            seed: 42,
        }
    }
}

/// Linear softmax policy trained with REINFORCE.
pub struct LinearSoftmax {
    logits: Linear,
    rng: StdRng,
}

impl LinearSoftmax {
    /// Constructs a policy for states of `in_dim` elements and `n_actions` actions.
    pub fn build(config: &LinearSoftmaxConfig, in_dim: usize, n_actions: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let logits = Linear::new(in_dim, n_actions, config.init_scale, &mut rng);
        Self { logits, rng }
    }

    /// Action probabilities of a flattened state.
    pub fn probs(&self, x: &[f64]) -> Vec<f64> {
        softmax(&self.logits.forward(x))
    }
}

impl<T: Element + Into<f64>> Policy<T> for LinearSoftmax {
    fn select_action(&mut self, state: &StackedState<'_, T>) -> Result<ActionId> {
        let x = features(&state.to_vec(), self.logits.in_dim)?;
        let probs = self.probs(&x);
        let u: f64 = self.rng.gen();
        let mut acc = 0.0;
        for (a, p) in probs.iter().enumerate() {
            acc += p;
            if u < acc {
                return Ok(a);
            }
        }
        Ok(probs.len() - 1)
    }

    fn fit(&mut self, batch: &PgBatch<T>, learning_rate: f64) -> Result<Record> {
        let n = batch.len();
        if n == 0 {
            return Ok(Record::empty());
        }
        let n_actions = self.logits.b.len();
        let scale = learning_rate / n as f64;
        let mut loss = 0.0;
        let mut entropy = 0.0;

        // Gradients are taken at the parameters before the update.
        let mut grads = Vec::with_capacity(n);
        for i in 0..n {
            let x = features(batch.state(i), self.logits.in_dim)?;
            let a = batch.actions[i];
            ensure!(a < n_actions, "invalid action {} in batch", a);
            let probs = self.probs(&x);
            let adv = batch.advantages[i];
            loss -= adv * probs[a].ln();
            entropy -= probs.iter().map(|p| p * p.ln()).sum::<f64>();
            grads.push((x, a, probs, adv));
        }
        for (x, a, probs, adv) in grads {
            for (o, p) in probs.iter().enumerate() {
                let indicator = if o == a { 1.0 } else { 0.0 };
                self.logits.add_scaled(o, &x, scale * adv * (indicator - p));
            }
        }

        Ok(Record::from_slice(&[
            ("policy_loss", RecordValue::Scalar(loss / n as f64)),
            ("entropy", RecordValue::Scalar(entropy / n as f64)),
        ]))
    }
}
