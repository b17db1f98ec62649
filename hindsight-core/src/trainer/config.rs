//! Configuration of [`Trainer`](super::Trainer).
use crate::{error::HindsightError, schedule::Schedule};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Number of steps of the stepping phase.
    pub num_steps: usize,

    /// Batch size of an optimization step.
    pub batch_size: usize,

    /// Interval of optimization steps in environment steps.
    pub learning_freq: usize,

    /// Interval of target network synchronization in environment steps.
    pub target_update_freq: usize,

    /// Fraction of the replay buffer capacity filled by a random policy before stepping.
    pub init_buffer_size: f64,

    /// Seed of the exploration RNG.
    pub seed: u64,

    /// Interval of flushing records in environment steps.
    pub record_interval: usize,

    /// Stop after this many episodes of the stepping phase.
    #[serde(default)]
    pub max_episodes: Option<usize>,

    /// Stop after this many seconds of wall-clock time.
    #[serde(default)]
    pub max_duration_secs: Option<u64>,

    /// Exploration rate as a function of the step.
    pub exploration: Schedule,

    /// Learning rate as a function of the step.
    pub learning_rate: Schedule,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_steps: 1_000_000,
            batch_size: 32,
            learning_freq: 4,
            target_update_freq: 10_000,
            init_buffer_size: 0.05,
            seed: 42,
            record_interval: 10_000,
            max_episodes: None,
            max_duration_secs: None,
            exploration: Schedule::PiecewiseLinear {
                endpoints: vec![(0, 1.0), (1_000_000, 0.1), (5_000_000, 0.01)],
                outside_value: None,
            },
            learning_rate: Schedule::Constant(1e-4),
        }
    }
}

impl TrainerConfig {
    /// Sets the number of steps.
    pub fn num_steps(mut self, v: usize) -> Self {
        self.num_steps = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the interval of optimization in environment steps.
    pub fn learning_freq(mut self, v: usize) -> Self {
        self.learning_freq = v;
        self
    }

    /// Sets the interval of target network synchronization.
    pub fn target_update_freq(mut self, v: usize) -> Self {
        self.target_update_freq = v;
        self
    }

    /// Sets the fraction of the buffer filled before stepping.
    pub fn init_buffer_size(mut self, v: f64) -> Self {
        self.init_buffer_size = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the interval of flushing records.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Sets the maximum number of episodes.
    pub fn max_episodes(mut self, v: Option<usize>) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the wall-clock limit in seconds.
    pub fn max_duration_secs(mut self, v: Option<u64>) -> Self {
        self.max_duration_secs = v;
        self
    }

    /// Sets the exploration schedule.
    pub fn exploration(mut self, v: Schedule) -> Self {
        self.exploration = v;
        self
    }

    /// Sets the learning rate schedule.
    pub fn learning_rate(mut self, v: Schedule) -> Self {
        self.learning_rate = v;
        self
    }

    /// Number of random transitions inserted before stepping.
    pub fn n_fill(&self, capacity: usize) -> usize {
        (capacity as f64 * self.init_buffer_size) as usize
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), HindsightError> {
        for (name, v) in [
            ("batch_size", self.batch_size),
            ("learning_freq", self.learning_freq),
            ("target_update_freq", self.target_update_freq),
            ("record_interval", self.record_interval),
        ] {
            if v == 0 {
                return Err(HindsightError::config(format!("{} must be positive", name)));
            }
        }
        if !(0.0..=1.0).contains(&self.init_buffer_size) {
            return Err(HindsightError::config(format!(
                "init_buffer_size must be in [0, 1], got {}",
                self.init_buffer_size
            )));
        }
        self.exploration.validate_probability()?;
        self.learning_rate.validate()?;
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .num_steps(100)
            .target_update_freq(50)
            .max_episodes(Some(3))
            .learning_rate(Schedule::Linear {
                start: 1e-3,
                end: 1e-4,
                steps: 100,
            });

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(TrainerConfig::default().validate().is_ok());
        assert!(TrainerConfig::default().batch_size(0).validate().is_err());
        assert!(TrainerConfig::default()
            .init_buffer_size(1.5)
            .validate()
            .is_err());
        assert!(TrainerConfig::default()
            .exploration(Schedule::Constant(2.0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_n_fill() {
        let config = TrainerConfig::default().init_buffer_size(0.05);
        assert_eq!(config.n_fill(10_000), 500);
        assert_eq!(config.init_buffer_size(0.0).n_fill(10_000), 0);
    }
}
