//! End-to-end runs on the corridor.
use crate::{
    corridor::{Corridor, CorridorConfig},
    linear::{LinearQ, LinearQConfig, LinearSoftmax, LinearSoftmaxConfig},
};
use anyhow::Result;
use hindsight_core::{
    evaluator::{DefaultEvaluator, Evaluator},
    pg::{PgTrainer, PgTrainerConfig, PgTrainingState},
    record::{Record, Recorder},
    replay_buffer::{ReplayBuffer, ReplayBufferConfig},
    schedule::Schedule,
    trainer::{Trainer, TrainerConfig, TrainingLoopState},
    Env,
};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Loads a YAML file.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;
    let rdr = BufReader::new(file);
    let b = serde_yaml::from_reader(rdr)?;
    Ok(b)
}

/// Saves a value as YAML.
pub fn save_yaml<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(value)?.as_bytes())?;
    Ok(())
}

/// Configuration of a DQN run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnRunConfig {
    /// Environment.
    pub env: CorridorConfig,

    /// Replay buffer. `obs_shape` is taken from the environment.
    pub replay_buffer: ReplayBufferConfig,

    /// Training loop.
    pub trainer: TrainerConfig,

    /// Q-function.
    pub model: LinearQConfig,

    /// Number of evaluation episodes after training.
    pub n_eval_episodes: usize,
}

impl Default for DqnRunConfig {
    fn default() -> Self {
        Self {
            env: CorridorConfig::default(),
            replay_buffer: ReplayBufferConfig::default().capacity(10_000).history_length(2),
            trainer: TrainerConfig::default()
                .num_steps(20_000)
                .batch_size(32)
                .learning_freq(4)
                .target_update_freq(500)
                .record_interval(1_000)
                .exploration(Schedule::Linear {
                    start: 1.0,
                    end: 0.05,
                    steps: 10_000,
                })
                .learning_rate(Schedule::Constant(0.05)),
            model: LinearQConfig::default(),
            n_eval_episodes: 5,
        }
    }
}

/// Configuration of a policy-gradient run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PgRunConfig {
    /// Environment.
    pub env: CorridorConfig,

    /// Training loop.
    pub trainer: PgTrainerConfig,

    /// Policy.
    pub policy: LinearSoftmaxConfig,
}

impl Default for PgRunConfig {
    fn default() -> Self {
        Self {
            env: CorridorConfig::default(),
            trainer: PgTrainerConfig::default()
                .max_steps(None)
                .max_iters(Some(100))
                .min_steps_per_batch(500)
                .normalize_advantages(true)
                .learning_rate(Schedule::Constant(0.1)),
            policy: LinearSoftmaxConfig::default(),
        }
    }
}

/// Trains a [`LinearQ`] on the corridor, then evaluates it.
///
/// Returns the final training state and the evaluation record.
pub fn run_dqn<R: Recorder>(
    config: &DqnRunConfig,
    recorder: &mut R,
    render: bool,
) -> Result<(TrainingLoopState, Record)> {
    let env = Corridor::build(&config.env)?;
    let obs_shape = env.obs_shape();
    let buffer_config = config
        .replay_buffer
        .clone()
        .obs_shape(obs_shape.dims().to_vec());
    let mut buffer = ReplayBuffer::<f32>::build(&buffer_config)?;
    let k = buffer.history_length();
    let mut model = LinearQ::build(&config.model, obs_shape.numel() * k, env.n_actions());
    let mut trainer = Trainer::build(config.trainer.clone())?;

    let state = trainer.train(env, &mut model, &mut buffer, recorder)?;

    let eval_env = Corridor::build(&config.env)?;
    let mut evaluator =
        DefaultEvaluator::new(eval_env, k, config.n_eval_episodes, config.trainer.seed)?
            .render(render);
    let record = evaluator.evaluate(&mut model)?;
    info!("Evaluation: {:?}", record.get_scalar("episode_return")?);
    Ok((state, record))
}

/// Trains a [`LinearSoftmax`] policy on the corridor.
pub fn run_pg<R: Recorder>(config: &PgRunConfig, recorder: &mut R) -> Result<PgTrainingState> {
    let env = Corridor::build(&config.env)?;
    let in_dim = env.obs_shape().numel() * config.trainer.history_length;
    let mut policy = LinearSoftmax::build(&config.policy, in_dim, env.n_actions());
    let mut trainer = PgTrainer::build(config.trainer.clone())?;
    trainer.train(env, &mut policy, None, recorder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_core::{record::BufferedRecorder, trainer::Phase};
    use tempdir::TempDir;

    #[test]
    fn test_run_dqn() -> Result<()> {
        let mut config = DqnRunConfig::default();
        config.env = config.env.length(4).max_steps(20);
        config.replay_buffer = config.replay_buffer.capacity(500);
        config.trainer = config.trainer.num_steps(300).record_interval(100);
        config.n_eval_episodes = 2;
        let mut recorder = BufferedRecorder::new();

        let (state, record) = run_dqn(&config, &mut recorder, false)?;

        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.step, 300);
        assert_eq!(state.env_steps, 325);
        assert!(state.opt_steps > 0);
        assert_eq!(record.get_array1("episode_returns")?.len(), 2);
        assert_eq!(recorder.flushed_steps(), &[100, 200, 300, 300]);
        Ok(())
    }

    #[test]
    fn test_run_pg() -> Result<()> {
        let mut config = PgRunConfig::default();
        config.env = config.env.length(4).max_steps(20);
        config.trainer = config.trainer.max_iters(Some(2)).min_steps_per_batch(30);
        let mut recorder = BufferedRecorder::new();

        let state = run_pg(&config, &mut recorder)?;

        assert_eq!(state.iters, 2);
        assert!(state.env_steps >= 60);
        assert_eq!(recorder.with_key("policy_loss").count(), 2);
        Ok(())
    }

    #[test]
    fn test_serde_run_configs() -> Result<()> {
        let dir = TempDir::new("run_config")?;
        let path = dir.path().join("dqn.yaml");
        let config = DqnRunConfig::default();
        save_yaml(&config, &path)?;
        assert_eq!(config, load_yaml::<DqnRunConfig>(&path)?);

        let path = dir.path().join("pg.yaml");
        let config = PgRunConfig::default();
        save_yaml(&config, &path)?;
        assert_eq!(config, load_yaml::<PgRunConfig>(&path)?);
        Ok(())
    }
}
