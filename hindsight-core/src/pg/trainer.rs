//! Training loop of policy-gradient agents.
use super::{
    discounted_sum_rewards, explained_variance, normalize_advantages, PgBatch, PgTrainerConfig,
    Trajectory,
};
use crate::{
    base::{Baseline, Env, Policy},
    record::{Record, RecordValue, Recorder},
    ring_buffer::RingBuffer,
    schedule::{self, BoxedSchedule, ScheduleFn},
    shape::Element,
};
use anyhow::{ensure, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Counters of [`PgTrainer`].
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct PgTrainingState {
    /// Iterations, i.e. calls of [`Policy::fit`].
    pub iters: usize,

    /// Completed episodes.
    pub episodes: usize,

    /// Environment steps.
    pub env_steps: usize,
}

/// Manages the training loop of a [`Policy`].
///
/// Each iteration:
///
/// 1. Rolls out whole episodes until at least `min_steps_per_batch` steps
///    were collected. The frame history is reset at every episode start.
/// 2. Computes discounted returns. With a [`Baseline`], advantages are the
///    returns minus the baseline values, otherwise the returns themselves.
/// 3. Optionally standardizes the advantages over the batch.
/// 4. Calls [`Policy::fit`] with the learning rate of the iteration.
/// 5. Records batch statistics and stops once any configured limit is hit.
///
/// The learning rate is a function of the iteration count. It follows the
/// configured [`Schedule`](crate::schedule::Schedule) unless replaced by
/// [`PgTrainer::with_learning_rate`].
pub struct PgTrainer {
    config: PgTrainerConfig,
    learning_rate: BoxedSchedule,
}

impl PgTrainer {
    /// Constructs a trainer.
    pub fn build(config: PgTrainerConfig) -> Result<Self> {
        config.validate()?;
        let learning_rate = schedule::boxed(config.learning_rate.clone());
        Ok(Self {
            config,
            learning_rate,
        })
    }

    /// Replaces the configured learning-rate schedule.
    pub fn with_learning_rate<S: ScheduleFn + 'static>(mut self, learning_rate: S) -> Self {
        self.learning_rate = schedule::boxed(learning_rate);
        self
    }

    /// Configuration of the trainer.
    pub fn config(&self) -> &PgTrainerConfig {
        &self.config
    }

    fn rollout<E, P>(
        env: &mut E,
        history: &mut RingBuffer<E::Elem>,
        policy: &mut P,
    ) -> Result<Trajectory<E::Elem>>
    where
        E: Env,
        P: Policy<E::Elem>,
    {
        let state_len = history.shape().numel() * history.history_length();
        let mut traj = Trajectory::new(state_len);
        history.reset();
        let mut obs = env.reset()?;

        loop {
            history.append(&obs)?;
            let state = history.get_stack();
            let act = policy.select_action(&state)?;
            let step = env.step(act)?;
            traj.push(&state, act, step.reward);
            if step.is_done {
                return Ok(traj);
            }
            obs = step.obs;
        }
    }

    /// Rolls out whole episodes until `min_steps_per_batch` steps were taken.
    pub fn generate_trajectories<E, P>(
        &self,
        env: &mut E,
        history: &mut RingBuffer<E::Elem>,
        policy: &mut P,
        state: &mut PgTrainingState,
    ) -> Result<Vec<Trajectory<E::Elem>>>
    where
        E: Env,
        P: Policy<E::Elem>,
    {
        let mut trajectories = vec![];
        let mut n_steps = 0;
        while n_steps < self.config.min_steps_per_batch {
            let traj = Self::rollout(env, history, policy)?;
            n_steps += traj.len();
            state.env_steps += traj.len();
            state.episodes += 1;
            debug!(
                "Episode {}: reward = {}, length = {}",
                state.episodes,
                traj.total_reward(),
                traj.len()
            );
            trajectories.push(traj);
        }
        Ok(trajectories)
    }

    /// Fills returns, baseline values and advantages of a trajectory.
    pub fn add_advantages<T>(
        &self,
        traj: &mut Trajectory<T>,
        baseline: Option<&mut (dyn Baseline<T> + '_)>,
    ) -> Result<()>
    where
        T: Element,
    {
        traj.returns = discounted_sum_rewards(&traj.rewards, self.config.gamma);
        match baseline {
            Some(b) => {
                let values = b.compute_baseline(&traj.states, traj.len())?;
                ensure!(
                    values.len() == traj.len(),
                    "baseline returned {} values for {} states",
                    values.len(),
                    traj.len()
                );
                traj.advantages = traj.returns.iter().zip(&values).map(|(g, b)| g - b).collect();
                traj.baseline = values;
            }
            None => {
                traj.advantages = traj.returns.clone();
                traj.baseline = vec![0.0; traj.len()];
            }
        }
        Ok(())
    }

    /// Runs the training loop and returns its counters.
    pub fn train<E, P, D>(
        &mut self,
        mut env: E,
        policy: &mut P,
        mut baseline: Option<&mut dyn Baseline<E::Elem>>,
        recorder: &mut D,
    ) -> Result<PgTrainingState>
    where
        E: Env,
        P: Policy<E::Elem>,
        D: Recorder,
    {
        let mut history = RingBuffer::new(env.obs_shape(), self.config.history_length)?;
        let state_shape = history.shape().stacked(self.config.history_length);
        let mut state = PgTrainingState::default();

        loop {
            let mut trajs = self.generate_trajectories(&mut env, &mut history, policy, &mut state)?;
            for traj in trajs.iter_mut() {
                self.add_advantages(traj, baseline.as_deref_mut())?;
            }
            let mean_reward =
                trajs.iter().map(|t| t.total_reward()).sum::<f64>() / trajs.len() as f64;

            let mut batch = PgBatch::from_trajectories(&trajs, state_shape.clone());
            if self.config.normalize_advantages {
                normalize_advantages(&mut batch.advantages, self.config.advantage_eps);
            }

            let lr = self.learning_rate.value(state.iters);
            let mut record = policy.fit(&batch, lr)?;
            state.iters += 1;

            record.insert("mean_episode_reward", RecordValue::Scalar(mean_reward));
            record.insert("batch_size", RecordValue::Scalar(batch.len() as f64));
            record.insert("learning_rate", RecordValue::Scalar(lr));
            record.insert("episodes", RecordValue::Scalar(state.episodes as f64));
            record.insert("env_steps", RecordValue::Scalar(state.env_steps as f64));
            if baseline.is_some() {
                let ev = explained_variance(&batch.baseline_targets, &batch.baseline);
                record.insert("explained_variance", RecordValue::Scalar(ev));
            }
            recorder.store(record);
            recorder.flush(state.iters as i64);

            info!(
                "Iter {} | Episode {} | Step {}",
                state.iters, state.episodes, state.env_steps
            );

            if self.is_finished(&state) {
                break;
            }
        }

        Ok(state)
    }

    fn is_finished(&self, state: &PgTrainingState) -> bool {
        let reached = |limit: Option<usize>, v: usize| limit.map_or(false, |n| v >= n);
        reached(self.config.max_iters, state.iters)
            || reached(self.config.max_episodes, state.episodes)
            || reached(self.config.max_steps, state.env_steps)
    }
}
