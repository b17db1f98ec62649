//! Training loop of DQN-style agents.
mod config;
mod sampler;
mod state;
use crate::{
    base::{Env, ExperienceBufferBase, QModel, ReplayBufferBase, Transition},
    explorer::EpsilonGreedy,
    record::{Record, RecordValue, Recorder},
    replay_buffer::TransitionBatch,
    schedule::{self, BoxedSchedule, ScheduleFn},
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::{debug, info, trace};
use rand::{rngs::StdRng, SeedableRng};
pub use sampler::{Sampler, StepOutcome};
pub use state::{Phase, TrainingLoopState};
use std::time::{Duration, Instant};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// # Training loop
///
/// The loop is a state machine over [`Phase`]:
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Filling
///     Filling --> Filling: random action
///     Filling --> Stepping: buffer holds n_fill transitions
///     Stepping --> Learning: step % learning_freq == 0
///     Learning --> Syncing: step % target_update_freq == 0
///     Learning --> Stepping
///     Stepping --> Syncing: step % target_update_freq == 0
///     Syncing --> Stepping
///     Stepping --> Done: stop condition
///     Done --> [*]
/// ```
///
/// 1. *Filling*. `init_buffer_size * capacity` transitions are generated by a
///    uniformly random policy. The target network is then synchronized once.
/// 2. *Stepping*. The action for the stacked state of the pending observation
///    is chosen by [`EpsilonGreedy`] with the exploration rate of the current
///    step, the environment is stepped and the transition is pushed.
/// 3. *Learning*. On steps where `step % learning_freq == 0`, a batch is
///    sampled and [`QModel::train`] is called with the learning rate of the
///    current step. The step is skipped while the buffer cannot serve
///    `batch_size` samples.
/// 4. *Syncing*. On steps where `step % target_update_freq == 0`,
///    [`QModel::update_target_net`] is called.
/// 5. *Done*. Reached after `num_steps` steps, or earlier when `max_episodes`
///    episodes finished or `max_duration_secs` elapsed.
///
/// Both modulo conditions hold at step 0, so an optimization step and a sync
/// happen on the very first step when the buffer allows it.
///
/// The exploration rate and the learning rate follow the [`Schedule`]s of
/// [`TrainerConfig`] unless replaced by [`Trainer::with_exploration`] or
/// [`Trainer::with_learning_rate`], which accept any [`ScheduleFn`]
/// including closures.
///
/// [`Schedule`]: crate::schedule::Schedule
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[QModel]-->|ActionId|B[Env]
///     B -->|Observation|C[Sampler]
///     C -->|StackedState|A
///     C -->|Transition|D[ReplayBuffer]
///     D -->|TransitionBatch|A
/// ```
pub struct Trainer {
    config: TrainerConfig,
    explorer: EpsilonGreedy<BoxedSchedule>,
    learning_rate: BoxedSchedule,
    rng: StdRng,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let explorer = EpsilonGreedy::new(schedule::boxed(config.exploration.clone()));
        let learning_rate = schedule::boxed(config.learning_rate.clone());
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            explorer,
            learning_rate,
            rng,
        })
    }

    /// Replaces the configured exploration schedule.
    ///
    /// Values are clamped into `[0, 1]` when used.
    pub fn with_exploration<S: ScheduleFn + 'static>(mut self, exploration: S) -> Self {
        self.explorer = EpsilonGreedy::new(schedule::boxed(exploration));
        self
    }

    /// Replaces the configured learning-rate schedule.
    pub fn with_learning_rate<S: ScheduleFn + 'static>(mut self, learning_rate: S) -> Self {
        self.learning_rate = schedule::boxed(learning_rate);
        self
    }

    /// Configuration of the trainer.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Generates `n_fill` transitions with a uniformly random policy.
    pub fn fill<E, R>(
        &mut self,
        sampler: &mut Sampler<E>,
        buffer: &mut R,
        state: &mut TrainingLoopState,
        n_fill: usize,
    ) -> Result<()>
    where
        E: Env,
        R: ExperienceBufferBase<Item = Transition<E::Elem>>,
    {
        state.phase = Phase::Filling;
        info!("Filling replay buffer with {} random transitions", n_fill);
        for _ in 0..n_fill {
            let outcome = sampler.sample_and_push(buffer, |_, env| Ok(env.sample_action()))?;
            state.on_env_step(outcome.reward, outcome.is_done);
        }
        state.reset_episode();
        info!("Filled replay buffer: {} transitions", buffer.len());
        Ok(())
    }

    /// Performs a single iteration of the stepping phase.
    ///
    /// Returns the values recorded in this iteration, possibly empty. On
    /// return `state.phase` is the last phase entered during the iteration:
    /// `Syncing` if the target network was synchronized, `Learning` if only
    /// an optimization step ran, `Stepping` otherwise.
    pub fn train_step<E, M, R>(
        &mut self,
        sampler: &mut Sampler<E>,
        model: &mut M,
        buffer: &mut R,
        state: &mut TrainingLoopState,
    ) -> Result<Record>
    where
        E: Env,
        M: QModel<E::Elem>,
        R: ExperienceBufferBase<Item = Transition<E::Elem>>
            + ReplayBufferBase<Batch = TransitionBatch<E::Elem>>,
    {
        let step = state.step;
        let mut record = Record::empty();

        state.phase = Phase::Stepping;
        let outcome = {
            let explorer = &self.explorer;
            let rng = &mut self.rng;
            let model = &mut *model;
            sampler.sample_and_push(buffer, |s, env| {
                explorer.action(step, s, env, &mut *model, &mut *rng)
            })?
        };
        if let Some((reward, len)) = state.on_env_step(outcome.reward, outcome.is_done) {
            state.episodes += 1;
            state.last_episode_reward = Some(reward);
            info!(
                "Episode {} finished at step {}: reward = {}, length = {}",
                state.episodes, step, reward, len
            );
            record.insert("episode_reward", RecordValue::Scalar(reward));
            record.insert("episode_length", RecordValue::Scalar(len as f64));
        }

        if step % self.config.learning_freq == 0 {
            if buffer.can_sample(self.config.batch_size) {
                state.phase = Phase::Learning;
                let lr = self.learning_rate.value(step);
                let batch = buffer.batch(self.config.batch_size)?;
                record = record.merge(model.train(&batch, lr)?);
                record.insert("learning_rate", RecordValue::Scalar(lr));
                state.opt_steps += 1;
                trace!("Optimization step {} at step {}", state.opt_steps, step);
            } else {
                debug!(
                    "Skipped learning at step {}: buffer holds {} transitions",
                    step,
                    buffer.len()
                );
            }
        }

        if step % self.config.target_update_freq == 0 {
            state.phase = Phase::Syncing;
            model.update_target_net()?;
            state.target_syncs += 1;
            debug!("Synchronized target network at step {}", step);
        }

        if !record.is_empty() {
            record.insert("epsilon", RecordValue::Scalar(self.explorer.epsilon(step)));
        }
        state.step += 1;
        Ok(record)
    }

    fn is_finished(&self, state: &TrainingLoopState, elapsed: Duration) -> bool {
        if state.step >= self.config.num_steps {
            return true;
        }
        if let Some(n) = self.config.max_episodes {
            if state.episodes >= n {
                info!("Reached {} episodes", n);
                return true;
            }
        }
        if let Some(secs) = self.config.max_duration_secs {
            if elapsed >= Duration::from_secs(secs) {
                info!("Reached time limit of {} seconds", secs);
                return true;
            }
        }
        false
    }

    /// Runs the training loop and returns its final state.
    pub fn train<E, M, R, D>(
        &mut self,
        env: E,
        model: &mut M,
        buffer: &mut R,
        recorder: &mut D,
    ) -> Result<TrainingLoopState>
    where
        E: Env,
        M: QModel<E::Elem>,
        R: ExperienceBufferBase<Item = Transition<E::Elem>>
            + ReplayBufferBase<Batch = TransitionBatch<E::Elem>>,
        D: Recorder,
    {
        let mut sampler = Sampler::new(env, buffer.history_length())?;
        let mut state = TrainingLoopState::default();
        let timer = Instant::now();

        let n_fill = self.config.n_fill(buffer.capacity());
        self.fill(&mut sampler, buffer, &mut state, n_fill)?;

        model.update_target_net()?;
        state.target_syncs += 1;
        state.phase = Phase::Stepping;
        info!("Start stepping: {} steps", self.config.num_steps);

        while !self.is_finished(&state, timer.elapsed()) {
            let record = self.train_step(&mut sampler, model, buffer, &mut state)?;
            if !record.is_empty() {
                recorder.store(record);
            }
            if state.step % self.config.record_interval == 0 {
                let mut record = Record::from_slice(&[
                    ("env_steps", RecordValue::Scalar(state.env_steps as f64)),
                    ("opt_steps", RecordValue::Scalar(state.opt_steps as f64)),
                    ("episodes", RecordValue::Scalar(state.episodes as f64)),
                    ("datetime", RecordValue::DateTime(Local::now())),
                ]);
                if let Some(r) = state.last_episode_reward {
                    record.insert("last_episode_reward", RecordValue::Scalar(r));
                }
                recorder.store(record);
                recorder.flush(state.step as i64);
            }
        }

        state.phase = Phase::Done;
        recorder.flush(state.step as i64);
        info!(
            "Training finished: {} steps, {} episodes, {} optimization steps, {} target syncs in {:.1}s",
            state.step,
            state.episodes,
            state.opt_steps,
            state.target_syncs,
            timer.elapsed().as_secs_f64()
        );
        Ok(state)
    }
}
